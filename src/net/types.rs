//! Wire types and errors shared by the gateway and the typed endpoints.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::session::User;
use crate::validate::ValidationError;

// =============================================================================
// ERRORS
// =============================================================================

/// Failure to reach the backend at all. Never conflated with a 401.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or its body not read.
    #[error("network request failed: {0}")]
    Network(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Tagged failure for a typed API call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Input rejected before anything was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend returned 401 and the session could not be refreshed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success HTTP status.
    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// The backend could not be reached.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A success response did not have the documented shape.
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        let message = response.error_message();
        if response.is_unauthorized() {
            Self::Unauthorized(message)
        } else {
            Self::Server { status: response.status, message }
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Unauthorized(_) => "E_UNAUTHORIZED",
            Self::Server { .. } => "E_SERVER",
            Self::Transport(_) => "E_NETWORK",
            Self::Decode(_) => "E_DECODE",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Network(_)) | Self::Server { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

/// What the UI layer asks the gateway to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API root, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// A 401 on this request triggers the refresh protocol.
    pub requires_auth: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), query: Vec::new(), body: None, requires_auth: true }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self { method: Method::POST, path: path.into(), query: Vec::new(), body: Some(body), requires_auth: true }
    }

    /// Mark the request as not needing a session (login, register, ...).
    #[must_use]
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Raw HTTP response as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body. An empty body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let text = if self.body.trim().is_empty() { "null" } else { self.body.as_str() };
        serde_json::from_str(text)
    }

    /// Human-readable failure text: the body's `message`, else the body, else the status.
    #[must_use]
    pub fn error_message(&self) -> String {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
        }

        if let Ok(ErrorBody { message }) = serde_json::from_str::<ErrorBody>(&self.body) {
            return message;
        }
        let trimmed = self.body.trim();
        if trimmed.is_empty() { format!("HTTP {}", self.status) } else { trimmed.to_owned() }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// `{ "data": ... }` success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Token triple issued by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub symbol: String,
    pub amount: f64,
    pub current_price: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioData {
    pub portfolio: Vec<PortfolioItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAndLoss {
    pub current_value: f64,
    pub cost_basis: f64,
    pub profit_or_loss: f64,
}

/// `symbol -> currency -> price`, e.g. `bitcoin -> usd -> 64000.0`.
pub type Prices = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
}

/// Acknowledgement body; the message is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub message: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
