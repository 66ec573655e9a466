use serde::{Deserialize, Serialize};

/// Authenticated user record as returned by login and refresh.
///
/// The backend names the identifier `_id`; `id` is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Snapshot of the session singleton owned by [`super::SessionStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Bearer credential; empty means absent.
    pub access_token: String,
    /// Only ever sent to the refresh endpoint; empty means absent.
    pub refresh_token: String,
    pub user: Option<User>,
    pub is_authenticated: bool,
    /// A status check or refresh is outstanding.
    pub loading: bool,
    /// Last human-readable failure.
    pub error: Option<String>,
}

impl Session {
    /// `true` when no credential or user is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty() && self.refresh_token.is_empty() && self.user.is_none()
    }
}
