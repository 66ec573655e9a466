//! Route guard: decides whether a protected view may render.
//!
//! DESIGN
//! ======
//! Each navigation gets a `Navigation` ticket that starts in `Resolving`
//! unless the session is already authenticated. Resolving runs the status
//! check once (or waits for one already in progress) and settles the ticket
//! in `Authenticated` or `Unauthenticated`. A newer `navigate()` supersedes
//! older tickets; their completions are dropped so a retired view is never
//! updated.
//!
//! The loading flag always wins: while it is set the only possible view is
//! the interstitial, whatever the authentication flag says. The flag is
//! raised by the status check here and by a refresh exchange in the network
//! layer; resolving waits for either to settle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::session::{LoadingGuard, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Resolving,
    Authenticated,
    Unauthenticated,
}

/// What the UI should show for a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    Protected,
    Interstitial,
    RedirectToLogin,
}

/// One navigation to a protected view.
#[derive(Debug)]
pub struct Navigation {
    id: u64,
    phase: GuardPhase,
}

impl Navigation {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> GuardPhase {
        self.phase
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    store: SessionStore,
    generation: Arc<AtomicU64>,
    splash_delay: Duration,
}

impl RouteGuard {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self { store, generation: Arc::new(AtomicU64::new(0)), splash_delay: Duration::ZERO }
    }

    /// Hold the interstitial for at least `delay` before checking status.
    #[must_use]
    pub fn with_splash_delay(mut self, delay: Duration) -> Self {
        self.splash_delay = delay;
        self
    }

    /// Start a navigation, superseding any earlier one.
    pub fn navigate(&self) -> Navigation {
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = self.store.snapshot();
        let phase = if session.is_authenticated && !session.loading {
            GuardPhase::Authenticated
        } else {
            GuardPhase::Resolving
        };
        Navigation { id, phase }
    }

    /// Whether `navigation` is still the latest one.
    #[must_use]
    pub fn is_current(&self, navigation: &Navigation) -> bool {
        self.generation.load(Ordering::SeqCst) == navigation.id
    }

    /// Current view for `navigation`, without side effects.
    #[must_use]
    pub fn view(&self, navigation: &Navigation) -> GuardView {
        let session = self.store.snapshot();
        if session.loading {
            return GuardView::Interstitial;
        }
        match navigation.phase {
            GuardPhase::Resolving => GuardView::Interstitial,
            GuardPhase::Authenticated if session.is_authenticated => GuardView::Protected,
            GuardPhase::Authenticated | GuardPhase::Unauthenticated => GuardView::RedirectToLogin,
        }
    }

    /// Settle a resolving navigation and return its view.
    ///
    /// Returns `None` when a newer navigation superseded this one while the
    /// status check was outstanding.
    pub async fn resolve(&self, navigation: &mut Navigation) -> Option<GuardView> {
        if navigation.phase == GuardPhase::Resolving {
            let authenticated = if let Some(loading) = self.store.begin_loading() {
                self.run_status_check(loading).await
            } else {
                self.wait_for_settle().await
            };

            if !self.is_current(navigation) {
                tracing::debug!(navigation = navigation.id, "discarding status check for superseded navigation");
                return None;
            }
            navigation.phase = if authenticated { GuardPhase::Authenticated } else { GuardPhase::Unauthenticated };
        }
        Some(self.view(navigation))
    }

    /// `navigate` followed by `resolve`.
    pub async fn enter(&self) -> Option<GuardView> {
        let mut navigation = self.navigate();
        self.resolve(&mut navigation).await
    }

    async fn run_status_check(&self, loading: LoadingGuard) -> bool {
        if !self.splash_delay.is_zero() {
            tokio::time::sleep(self.splash_delay).await;
        }
        let authenticated = self.store.check_login_status();
        drop(loading);
        tracing::debug!(authenticated, "login status resolved");
        authenticated
    }

    async fn wait_for_settle(&self) -> bool {
        let mut changes = self.store.subscribe();
        match changes.wait_for(|session| !session.loading).await {
            Ok(session) => session.is_authenticated,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
