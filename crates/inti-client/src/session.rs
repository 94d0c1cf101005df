//! Persistent login state: authentication flag, bearer token, and the cached
//! user-identity blob.
//!
//! The blob is kept opaque (`serde_json::Value`) because the backend decides
//! its shape; [`crate::extract`] reads identities out of it.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Backend the session belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Cached user-identity blob written at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl StoredSession {
    /// Logged in means the flag is set and a non-empty token is present.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Storage backend for [`StoredSession`].
pub trait SessionStore: Send + Sync {
    /// Loads the session; a missing session is the default (logged out) one.
    fn load(&self) -> Result<StoredSession, StoreError>;

    fn save(&self, session: &StoredSession) -> Result<(), StoreError>;

    /// Removes the session. Returns `true` when something was removed.
    fn clear(&self) -> Result<bool, StoreError>;
}

/// JSON file store, one file per CLI profile.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.inti/session.<profile>.json`.
    pub fn for_profile(profile: &str) -> Result<Self, StoreError> {
        let dir = dirs::home_dir().ok_or(StoreError::NoHomeDir)?.join(".inti");
        Ok(Self::new(dir.join(format!("session.{profile}.json"))))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<StoredSession, StoreError> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, session: &StoredSession) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StoredSession>> {
        // A poisoned lock still holds a consistent Option.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<StoredSession, StoreError> {
        Ok(self.lock().clone().unwrap_or_default())
    }

    fn save(&self, session: &StoredSession) -> Result<(), StoreError> {
        *self.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<bool, StoreError> {
        Ok(self.lock().take().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> StoredSession {
        StoredSession {
            server: Some("http://localhost:8080".into()),
            authenticated: true,
            token: Some("jwt".into()),
            user: Some(json!({ "id": 7, "username": "ana" })),
        }
    }

    #[test]
    fn test_is_authenticated() {
        assert!(sample().is_authenticated());
        assert!(!StoredSession::default().is_authenticated());

        let mut flag_only = sample();
        flag_only.token = None;
        assert!(!flag_only.is_authenticated());

        let mut token_only = sample();
        token_only.authenticated = false;
        assert!(!token_only.is_authenticated());
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), StoredSession::default());
        assert!(!store.clear().unwrap());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());

        assert!(store.clear().unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileSessionStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(!store.load().unwrap().is_authenticated());
        store.save(&sample()).unwrap();
        assert!(store.load().unwrap().is_authenticated());
        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }
}
