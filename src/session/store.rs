use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::cookie::CookieMirror;
use super::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SessionStorage, USER_KEY};
use super::types::{Session, User};
use crate::net::types::ApiError;

/// Shared handle to the session singleton.
///
/// Cloning is cheap; every clone observes and mutates the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<Session>,
    storage: Arc<dyn SessionStorage>,
    cookies: Option<CookieMirror>,
    changes: watch::Sender<Session>,
}

impl SessionStore {
    /// Build the store from whatever the persistence adapter currently holds.
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        Self::build(storage, None)
    }

    /// Like [`Self::load`], additionally mirroring the access token into a cookie jar.
    #[must_use]
    pub fn load_with_cookies(storage: Arc<dyn SessionStorage>, cookies: CookieMirror) -> Self {
        Self::build(storage, Some(cookies))
    }

    fn build(storage: Arc<dyn SessionStorage>, cookies: Option<CookieMirror>) -> Self {
        let access_token = storage.get(ACCESS_TOKEN_KEY).unwrap_or_default();
        let refresh_token = storage.get(REFRESH_TOKEN_KEY).unwrap_or_default();
        let user = storage.get(USER_KEY).and_then(|raw| parse_user(&raw));
        let is_authenticated = !access_token.is_empty() && user.is_some();
        let session = Session { access_token, refresh_token, user, is_authenticated, loading: false, error: None };

        tracing::debug!(authenticated = is_authenticated, "session loaded from storage");
        let (changes, _) = watch::channel(session.clone());
        Self { inner: Arc::new(StoreInner { state: Mutex::new(session), storage, cookies, changes }) }
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Overwrite both tokens and the user, persisting all three.
    ///
    /// Tokens are opaque and not validated. The session counts as
    /// authenticated whenever the access token is non-empty.
    pub fn set_tokens(&self, access_token: impl Into<String>, refresh_token: impl Into<String>, user: User) {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        let user_json = serialize_user(&user);
        let user_id = user.id.clone();

        self.transition(|inner, session| {
            inner.storage.set(ACCESS_TOKEN_KEY, &access_token);
            inner.storage.set(REFRESH_TOKEN_KEY, &refresh_token);
            inner.storage.set(USER_KEY, &user_json);
            if let Some(cookies) = &inner.cookies {
                cookies.set(&access_token);
            }

            session.is_authenticated = !access_token.is_empty();
            session.access_token = access_token;
            session.refresh_token = refresh_token;
            session.user = Some(user);
            session.error = None;
        });
        tracing::info!(%user_id, "session tokens stored");
    }

    /// Clear the session and every persisted entry. Safe to call repeatedly.
    ///
    /// The loading flag belongs to whoever set it and is left untouched.
    pub fn reset_tokens(&self) {
        let was_authenticated = self.transition(|inner, session| {
            for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
                inner.storage.remove(key);
            }
            if let Some(cookies) = &inner.cookies {
                cookies.clear();
            }

            let was = session.is_authenticated;
            session.access_token.clear();
            session.refresh_token.clear();
            session.user = None;
            session.is_authenticated = false;
            session.error = None;
            was
        });
        if was_authenticated {
            tracing::info!("session reset");
        }
    }

    /// Record a diagnostic without touching authentication state.
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.transition(|_, session| session.error = Some(message));
    }

    pub fn set_loading(&self, loading: bool) {
        self.transition(|_, session| session.loading = loading);
    }

    /// Set the loading flag unless it is already set.
    ///
    /// Returns `None` when someone else holds the flag. Otherwise the flag
    /// stays set until the returned guard is dropped, including when the
    /// owning future is cancelled.
    #[must_use]
    pub fn begin_loading(&self) -> Option<LoadingGuard> {
        let acquired = self.transition(|_, session| !std::mem::replace(&mut session.loading, true));
        acquired.then(|| LoadingGuard { store: self.clone() })
    }

    /// Re-derive authentication from persisted storage.
    ///
    /// Authenticated only when both an access token and a user are stored.
    /// Otherwise both tokens are dropped; the in-memory user is kept.
    /// Returns the resulting authentication flag.
    pub fn check_login_status(&self) -> bool {
        self.transition(|inner, session| {
            let token = inner.storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty());
            let user = inner.storage.get(USER_KEY).and_then(|raw| parse_user(&raw));

            if let (Some(token), Some(user)) = (token, user) {
                session.access_token = token;
                session.refresh_token = inner.storage.get(REFRESH_TOKEN_KEY).unwrap_or_default();
                session.user = Some(user);
                session.is_authenticated = true;
            } else {
                inner.storage.remove(ACCESS_TOKEN_KEY);
                inner.storage.remove(REFRESH_TOKEN_KEY);
                session.access_token.clear();
                session.refresh_token.clear();
                session.is_authenticated = false;
            }
            session.is_authenticated
        })
    }

    /// Query form of the status check: the stored user, or a 401-class error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when no access token or user is stored.
    #[allow(clippy::unused_async)]
    pub async fn query_login_status(&self) -> Result<User, ApiError> {
        let token = self.inner.storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty());
        let user = self.inner.storage.get(USER_KEY).and_then(|raw| parse_user(&raw));
        match (token, user) {
            (Some(_), Some(user)) => Ok(user),
            _ => Err(ApiError::Unauthorized("Not authenticated".into())),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    #[must_use]
    pub fn access_token(&self) -> String {
        self.lock().access_token.clone()
    }

    #[must_use]
    pub fn refresh_token(&self) -> String {
        self.lock().refresh_token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Watch every transition. The receiver starts at the current session.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.changes.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation and its storage writes under one lock, then publish.
    fn transition<R>(&self, apply: impl FnOnce(&StoreInner, &mut Session) -> R) -> R {
        let mut session = self.lock();
        let result = apply(&self.inner, &mut session);
        self.inner.changes.send_replace(session.clone());
        result
    }
}

/// Holds the session's loading flag; clears it on drop.
#[must_use = "the loading flag is cleared as soon as the guard is dropped"]
pub struct LoadingGuard {
    store: SessionStore,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.lock();
        f.debug_struct("SessionStore")
            .field("is_authenticated", &session.is_authenticated)
            .field("loading", &session.loading)
            .finish_non_exhaustive()
    }
}

fn parse_user(raw: &str) -> Option<User> {
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, "stored user record is unreadable; treating as absent");
            None
        }
    }
}

fn serialize_user(user: &User) -> String {
    serde_json::to_string(user).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "user record could not be serialized");
        String::new()
    })
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
