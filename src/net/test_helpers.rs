//! Scripted backend for exercising the gateway without a network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use super::refresh::REFRESH_PATH;
use super::transport::{HttpRequest, Transport};
use super::types::{ApiResponse, TransportError};
use crate::session::{MemoryStorage, SessionStore, User};

type Handler = Box<dyn Fn(&HttpRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

pub struct MockBackend {
    handler: Handler,
    refresh_delay: Duration,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockBackend {
    pub fn new(handler: impl Fn(&HttpRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static) -> Self {
        Self { handler: Box::new(handler), refresh_delay: Duration::ZERO, requests: Mutex::new(Vec::new()) }
    }

    /// Hold every refresh exchange open for `delay` so concurrent callers overlap.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait::async_trait]
impl Transport for MockBackend {
    async fn send(&self, request: &HttpRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.path == REFRESH_PATH && !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        (self.handler)(request)
    }
}

pub fn ada() -> User {
    User { id: "u1".into(), name: "Ada".into(), email: "a@b.com".into() }
}

pub fn grant_body(access: &str, refresh: &str) -> String {
    json!({
        "data": {
            "accessToken": access,
            "refreshToken": refresh,
            "user": { "_id": "u1", "name": "Ada", "email": "a@b.com" }
        }
    })
    .to_string()
}

pub fn portfolio_body() -> String {
    json!({
        "data": {
            "portfolio": [
                { "symbol": "bitcoin", "amount": 0.5, "currentPrice": 64000.0, "totalValue": 32000.0 }
            ]
        }
    })
    .to_string()
}

/// Backend where `a1`/`r1` are the stale pair and `a2`/`r2` the rotated one.
///
/// Authenticated paths accept only `Bearer a2`. The refresh endpoint accepts
/// `r1` when `refresh_succeeds`, and rejects everything otherwise.
pub fn expiring_token_backend(refresh_succeeds: bool) -> MockBackend {
    MockBackend::new(move |request| {
        if request.path == REFRESH_PATH {
            let offered = request
                .body
                .as_ref()
                .and_then(|b| b.get("refreshToken"))
                .and_then(|v| v.as_str());
            return Ok(if refresh_succeeds && offered == Some("r1") {
                ApiResponse::new(200, grant_body("a2", "r2"))
            } else {
                ApiResponse::new(401, r#"{"message":"refresh token expired"}"#)
            });
        }
        if request.header("authorization") != Some("Bearer a2") {
            return Ok(ApiResponse::new(401, r#"{"message":"jwt expired"}"#));
        }
        Ok(match request.path.as_str() {
            "/users/portfolio" => ApiResponse::new(200, portfolio_body()),
            _ => ApiResponse::new(200, r#"{"data":{}}"#),
        })
    })
}

/// Store logged in with the stale `a1`/`r1` pair, plus its backing storage.
pub fn stale_session() -> (Arc<MemoryStorage>, SessionStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::load(storage.clone());
    store.set_tokens("a1", "r1", ada());
    (storage, store)
}
