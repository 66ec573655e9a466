//! Persistence adapter: durable key/value surface for the session entries.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures never reach callers. Reads degrade to `None` ("absent")
//! and writes are best-effort; both are logged so a silently dropped session
//! can still be diagnosed.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use uuid::Uuid;

pub const ACCESS_TOKEN_KEY: &str = "AccessToken";
pub const REFRESH_TOKEN_KEY: &str = "RefreshToken";
pub const USER_KEY: &str = "User";

/// The only keys the session store reads or writes.
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// Durable key/value storage for the three session entries.
///
/// [`super::SessionStore`] is the only caller.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

// =============================================================================
// FILE STORAGE
// =============================================================================

/// One file per key under a directory. Survives process restarts.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created lazily on the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        if SESSION_KEYS.contains(&key) {
            Some(self.dir.join(key))
        } else {
            tracing::warn!(key, "refusing to touch non-session storage key");
            None
        }
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "session storage read failed; treating as absent");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let Some(path) = self.path_for(key) else {
            return;
        };
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(error = %e, dir = %self.dir.display(), "session storage directory unavailable");
            return;
        }

        // Write-then-rename so a crash never leaves a half-written entry.
        let tmp = self.dir.join(format!(".{key}.{}", Uuid::new_v4()));
        let result = std::fs::write(&tmp, value).and_then(|()| std::fs::rename(&tmp, &path));
        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp);
            tracing::warn!(error = %e, path = %path.display(), "session storage write failed");
        }
    }

    fn remove(&self, key: &str) {
        let Some(path) = self.path_for(key) else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "session storage remove failed"),
        }
    }
}

// =============================================================================
// MEMORY STORAGE
// =============================================================================

/// Process-local storage, used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
