//! Authenticated request gateway.
//!
//! Order per call: attach credential, dispatch, (maybe) refresh, (maybe)
//! retry once. A retried request that fails again is returned as-is.

use std::sync::Arc;

use uuid::Uuid;

use super::refresh::{RefreshCoordinator, RefreshOutcome};
use super::transport::{HttpRequest, Transport};
use super::types::{ApiRequest, ApiResponse, TransportError};
use crate::session::SessionStore;

/// Headers sent on every request. The bearer header is omitted for an empty token.
pub(crate) fn json_headers(access_token: &str) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_owned(), "application/json".to_owned())];
    if !access_token.is_empty() {
        headers.push(("Authorization".to_owned(), format!("Bearer {access_token}")));
    }
    headers
}

#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    store: SessionStore,
    refresh: Arc<RefreshCoordinator>,
}

impl Gateway {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: SessionStore) -> Self {
        let refresh = Arc::new(RefreshCoordinator::new(transport.clone(), store.clone()));
        Self { transport, store, refresh }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Send `request`, recovering from one expired access token.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when the backend cannot be reached.
    /// HTTP error statuses, including a 401 that survived refresh, are `Ok`.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let request_id = Uuid::new_v4();
        let token = self.store.access_token();
        let response = self.dispatch(request, &token).await?;

        if !(request.requires_auth && response.is_unauthorized()) {
            return Ok(response);
        }

        tracing::info!(%request_id, path = %request.path, "access token rejected; attempting refresh");
        match self.refresh.refresh(&token).await {
            RefreshOutcome::Refreshed => {
                let token = self.store.access_token();
                let retried = self.dispatch(request, &token).await?;
                if retried.is_unauthorized() {
                    tracing::warn!(%request_id, path = %request.path, "retry after refresh still unauthorized");
                }
                Ok(retried)
            }
            RefreshOutcome::Failed => Ok(response),
        }
    }

    async fn dispatch(&self, request: &ApiRequest, access_token: &str) -> Result<ApiResponse, TransportError> {
        let outbound = HttpRequest {
            method: request.method.clone(),
            path: request.path.clone(),
            query: request.query.clone(),
            headers: json_headers(access_token),
            body: request.body.clone(),
        };
        self.transport.send(&outbound).await.inspect_err(|e| {
            tracing::warn!(error = %e, path = %request.path, "backend unreachable");
        })
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
