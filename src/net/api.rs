//! Typed backend operations used by the UI layer.
//!
//! Each method validates its input, sends through the [`Gateway`], and maps
//! the response to a payload or a tagged [`ApiError`]. Only `login`,
//! `logout` and a failed refresh change the session.

use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::gateway::Gateway;
use super::transport::{ReqwestTransport, Transport};
use super::types::{
    Ack, ApiError, ApiRequest, Envelope, PortfolioData, PortfolioItem, Prices, ProfitAndLoss, TokenGrant,
    TransactionKind, TransferReceipt, TransportError,
};
use crate::config::ClientConfig;
use crate::session::cookie::CookieMirror;
use crate::session::{FileStorage, SessionStorage, SessionStore, User};
use crate::validate::{self, ValidationError};

const LOGIN_FAILED: &str = "Login failed";

#[derive(Clone)]
pub struct ApiClient {
    gateway: Gateway,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: SessionStore) -> Self {
        Self { gateway: Gateway::new(transport, store) }
    }

    /// Wire up file-backed session storage, the cookie mirror and a reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is unusable or the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| ApiError::Transport(TransportError::HttpClientBuild(e.to_string())))?;
        let jar = Arc::new(Jar::default());
        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::new(&config.session_dir));
        let cookies = CookieMirror::new(jar.clone(), url, config.secure_cookies());
        let store = SessionStore::load_with_cookies(storage, cookies);
        let transport = ReqwestTransport::new(config.base_url.clone(), config.timeouts, Some(jar))?;
        Ok(Self::new(Arc::new(transport), store))
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        self.gateway.store()
    }

    // =========================================================================
    // ACCOUNT
    // =========================================================================

    /// `POST /users/login`. On success the session holds the issued tokens.
    ///
    /// # Errors
    ///
    /// Validation, credential, server and network failures. Each is also
    /// recorded on the session via `set_error`.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let result = self.login_inner(email, password).await;
        if let Err(e) = &result {
            let message = match e {
                ApiError::Validation(v) => v.to_string(),
                ApiError::Unauthorized(m) | ApiError::Server { message: m, .. } => m.clone(),
                ApiError::Transport(_) | ApiError::Decode(_) => LOGIN_FAILED.to_owned(),
            };
            self.store().set_error(message);
        }
        result
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<User, ApiError> {
        validate::credentials(email, password)?;
        let request = ApiRequest::post("/users/login", json!({ "email": email.trim(), "password": password })).public();
        let grant: TokenGrant = self.call(request).await?;
        if grant.access_token.is_empty() {
            return Err(ApiError::Decode("login response carried an empty access token".into()));
        }

        let user = grant.user.clone();
        self.store().set_tokens(grant.access_token, grant.refresh_token, grant.user);
        Ok(user)
    }

    /// `POST /users/` creates an active account. The session is unchanged;
    /// the caller is expected to send the user to login next.
    ///
    /// # Errors
    ///
    /// Validation, server and network failures.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Value, ApiError> {
        validate::registration(name, email, password)?;
        let body = json!({ "name": name.trim(), "email": email.trim(), "password": password, "active": true });
        self.call_raw(ApiRequest::post("/users/", body).public()).await
    }

    /// End the session locally. The backend keeps no logout endpoint.
    pub fn logout(&self) {
        self.store().reset_tokens();
    }

    /// # Errors
    ///
    /// Validation, server and network failures.
    pub async fn forgot_password(&self, email: &str) -> Result<Ack, ApiError> {
        validate::email(email)?;
        let request = ApiRequest::post("/users/forgot-password", json!({ "email": email.trim() })).public();
        self.call_ack(request).await
    }

    /// # Errors
    ///
    /// Validation, server and network failures.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Ack, ApiError> {
        if token.trim().is_empty() {
            return Err(ValidationError::ResetTokenRequired.into());
        }
        validate::password(new_password)?;
        let request =
            ApiRequest::post("/users/reset-password", json!({ "token": token.trim(), "newPassword": new_password }))
                .public();
        self.call_ack(request).await
    }

    // =========================================================================
    // PORTFOLIO
    // =========================================================================

    /// `GET /users/portfolio`
    ///
    /// # Errors
    ///
    /// Unauthorized once refresh has failed, plus server/network/decode failures.
    pub async fn portfolio(&self) -> Result<Vec<PortfolioItem>, ApiError> {
        let data: PortfolioData = self.call(ApiRequest::get("/users/portfolio")).await?;
        Ok(data.portfolio)
    }

    /// `GET /crypto/portfolio/pnl`
    ///
    /// # Errors
    ///
    /// Unauthorized once refresh has failed, plus server/network/decode failures.
    pub async fn pnl(&self) -> Result<ProfitAndLoss, ApiError> {
        self.call(ApiRequest::get("/crypto/portfolio/pnl")).await
    }

    /// `POST /crypto/transactions`. Returns the backend's transaction record.
    ///
    /// # Errors
    ///
    /// Validation, unauthorized, server and network failures.
    pub async fn create_transaction(&self, symbol: &str, kind: TransactionKind, amount: f64) -> Result<Value, ApiError> {
        validate::symbol(symbol)?;
        validate::amount(amount)?;
        let body = json!({ "symbol": symbol.trim(), "type": kind, "amount": amount });
        self.call_raw(ApiRequest::post("/crypto/transactions", body)).await
    }

    /// `POST /crypto/transfer` from the logged-in user to `receiver_id`.
    ///
    /// # Errors
    ///
    /// Unauthorized when no user is held, plus validation, server and network failures.
    pub async fn transfer(&self, receiver_id: &str, symbol: &str, amount: f64) -> Result<TransferReceipt, ApiError> {
        if receiver_id.trim().is_empty() {
            return Err(ValidationError::ReceiverRequired.into());
        }
        validate::symbol(symbol)?;
        validate::amount(amount)?;
        let Some(sender) = self.store().user() else {
            return Err(ApiError::Unauthorized("Not authenticated".into()));
        };

        let body = json!({
            "senderId": sender.id,
            "receiverId": receiver_id.trim(),
            "symbol": symbol.trim(),
            "amount": amount,
        });
        self.call_raw_typed(ApiRequest::post("/crypto/transfer", body)).await
    }

    /// `GET /crypto/prices?symbols=a,b,c` with an optional quote currency.
    ///
    /// # Errors
    ///
    /// Validation, server, network and decode failures.
    pub async fn prices(&self, symbols: &[String], currency: Option<&str>) -> Result<Prices, ApiError> {
        let symbols: Vec<&str> = symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(ValidationError::SymbolRequired.into());
        }

        let mut request = ApiRequest::get("/crypto/prices")
            .public()
            .query("symbols", symbols.join(","));
        if let Some(currency) = currency {
            request = request.query("currency", currency);
        }
        self.call(request).await
    }

    // =========================================================================
    // PLUMBING
    // =========================================================================

    /// Send and decode a `{ "data": T }` envelope.
    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.call_raw_typed(request).await?;
        Ok(envelope.data)
    }

    /// Acks have no fixed shape; keep a textual `message` when there is one.
    async fn call_ack(&self, request: ApiRequest) -> Result<Ack, ApiError> {
        let body = self.call_raw(request).await?;
        let message = match &body {
            Value::String(text) => Some(text.clone()),
            other => other.get("message").and_then(Value::as_str).map(str::to_owned),
        };
        Ok(Ack { message })
    }

    async fn call_raw(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.call_raw_typed(request).await
    }

    async fn call_raw_typed<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.gateway.send(&request).await?;
        if !response.is_success() {
            let err = ApiError::from_response(&response);
            tracing::debug!(path = %request.path, code = err.error_code(), "request failed");
            return Err(err);
        }
        response.json().map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
