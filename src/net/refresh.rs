//! Refresh protocol: single-flight exchange of the refresh token.
//!
//! DESIGN
//! ======
//! The first caller to see a 401 parks a `Shared` exchange future in
//! `in_flight`; anyone arriving while it runs clones that future instead of
//! starting another exchange. The exchange clears the slot as its last step,
//! after the store already holds the outcome, so a caller arriving later sees
//! the rotated access token and skips the exchange entirely.
//!
//! The refresh token is read from the store when the exchange fires, never
//! captured earlier. The session's loading flag is raised for the duration of
//! the exchange so the route guard shows the interstitial instead of a view
//! that may be about to lose its session.

use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::Method;

use super::gateway::json_headers;
use super::transport::{HttpRequest, Transport};
use super::types::{Envelope, TokenGrant};
use crate::session::SessionStore;

pub const REFRESH_PATH: &str = "/users/refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The store now holds a fresh access token.
    Refreshed,
    /// The session has been reset.
    Failed,
}

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: SessionStore,
    in_flight: Arc<Mutex<Option<InFlight>>>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: SessionStore) -> Self {
        Self { transport, store, in_flight: Arc::new(Mutex::new(None)) }
    }

    /// Recover from a 401 received while sending `rejected_token`.
    pub async fn refresh(&self, rejected_token: &str) -> RefreshOutcome {
        let flight = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

            let current = self.store.access_token();
            if !current.is_empty() && current != rejected_token {
                tracing::debug!("access token already rotated; skipping refresh exchange");
                return RefreshOutcome::Refreshed;
            }

            if let Some(flight) = slot.as_ref() {
                tracing::debug!("joining in-flight refresh");
                flight.clone()
            } else {
                let flight =
                    exchange(self.transport.clone(), self.store.clone(), self.in_flight.clone()).boxed().shared();
                *slot = Some(flight.clone());
                flight
            }
        };
        flight.await
    }

    /// Whether an exchange is currently running.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

async fn exchange(
    transport: Arc<dyn Transport>,
    store: SessionStore,
    slot: Arc<Mutex<Option<InFlight>>>,
) -> RefreshOutcome {
    let outcome = run_exchange(transport.as_ref(), &store).await;
    slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    outcome
}

async fn run_exchange(transport: &dyn Transport, store: &SessionStore) -> RefreshOutcome {
    // Held until the outcome is in the store. `None` while a status check owns the flag.
    let _loading = store.begin_loading();

    let refresh_token = store.refresh_token();
    if refresh_token.is_empty() {
        tracing::info!("no refresh token held; ending session");
        store.reset_tokens();
        return RefreshOutcome::Failed;
    }

    let request = HttpRequest {
        method: Method::POST,
        path: REFRESH_PATH.to_owned(),
        query: Vec::new(),
        headers: json_headers(""),
        body: Some(serde_json::json!({ "refreshToken": refresh_token })),
    };

    let failure = match transport.send(&request).await {
        Ok(response) if response.is_success() => match response.json::<Envelope<TokenGrant>>() {
            Ok(Envelope { data }) if !data.access_token.is_empty() => {
                store.set_tokens(data.access_token, data.refresh_token, data.user);
                tracing::info!("session refreshed");
                return RefreshOutcome::Refreshed;
            }
            Ok(_) => "refresh response carried an empty access token".to_owned(),
            Err(e) => format!("refresh response malformed: {e}"),
        },
        Ok(response) => format!("refresh rejected with status {}", response.status),
        Err(e) => e.to_string(),
    };

    tracing::warn!(reason = %failure, "refresh failed; ending session");
    store.reset_tokens();
    RefreshOutcome::Failed
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
