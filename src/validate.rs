//! Local input checks run before anything is sent to the backend.

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Name is required")]
    NameRequired,
    #[error("Symbol is required")]
    SymbolRequired,
    #[error("Receiver is required")]
    ReceiverRequired,
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Reset token is required")]
    ResetTokenRequired,
}

/// `local@domain.tld` with no whitespace.
pub fn email(raw: &str) -> Result<(), ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    if local.is_empty() || !domain_ok || domain.contains('@') || raw.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn password(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn credentials(email_raw: &str, password_raw: &str) -> Result<(), ValidationError> {
    email(email_raw)?;
    password(password_raw)
}

pub fn registration(name: &str, email_raw: &str, password_raw: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    credentials(email_raw, password_raw)
}

pub fn symbol(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() { Err(ValidationError::SymbolRequired) } else { Ok(()) }
}

/// Rejects zero, negatives and NaN.
pub fn amount(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 { Ok(()) } else { Err(ValidationError::NonPositiveAmount) }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
