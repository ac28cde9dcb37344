//! Session resolution.
//!
//! A session is the signed-in identity plus the bearer token the journal API
//! expects. The client never looks a session up on its own; it is handed a
//! [`SessionResolver`] at construction and asks it when a request needs one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{write_private, ConfigError, ConfigResult};
use crate::platform::data_dir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(alias = "apiToken")]
    pub api_token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn from_token(token: impl Into<String>) -> Self {
        Session {
            api_token: token.into(),
            email: None,
            first_name: None,
            last_name: None,
            created_at: None,
        }
    }

    /// Name to greet the user with: full name if known, else email.
    pub fn display_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.to_string()),
            _ => self.email.clone(),
        }
    }
}

/// Capability: resolve the current session, if any.
pub trait SessionResolver: Send + Sync {
    fn current_session(&self) -> Option<Session>;
}

/// Resolver that never finds a session.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSession;

impl SessionResolver for NoSession {
    fn current_session(&self) -> Option<Session> {
        None
    }
}

/// A session supplied up front, e.g. from `--token`.
#[derive(Debug, Clone)]
pub struct FixedSession(pub Session);

impl SessionResolver for FixedSession {
    fn current_session(&self) -> Option<Session> {
        Some(self.0.clone())
    }
}

/// Session cached on disk by `login`, stored as `session.toml` in the data directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn default_location() -> ConfigResult<Self> {
        let dir = data_dir().map_err(|e| ConfigError::DataDir(e.to_string()))?;
        Ok(Self::at(dir.join("session.toml")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> ConfigResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;

        let session: Session = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if session.api_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> ConfigResult<()> {
        let content = toml::to_string_pretty(session).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        write_private(&self.path, &content)?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Remove the cached session. Returns whether one existed.
    pub fn clear(&self) -> ConfigResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(true)
    }
}

impl SessionResolver for SessionStore {
    fn current_session(&self) -> Option<Session> {
        match self.load() {
            Ok(session) => session,
            Err(e) => {
                debug!("Ignoring unreadable session: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_session() -> Session {
        Session {
            api_token: "tok-123".to_string(),
            email: Some("a@b.com".to_string()),
            first_name: None,
            last_name: None,
            created_at: None,
        }
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("session.toml"));

        assert!(store.load().unwrap().is_none());
        store.save(&sample_session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_session()));
        assert_eq!(store.current_session(), Some(sample_session()));
    }

    #[test]
    fn test_store_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("session.toml"));

        assert!(!store.clear().unwrap());
        store.save(&sample_session()).unwrap();
        assert!(store.clear().unwrap());
        assert!(store.current_session().is_none());
    }

    #[test]
    fn test_store_empty_token_is_no_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "api_token = \"\"\n").unwrap();

        assert!(SessionStore::at(path).current_session().is_none());
    }

    #[test]
    fn test_store_corrupt_file_is_no_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "not toml at all [").unwrap();

        let store = SessionStore::at(path);
        assert!(store.load().is_err());
        assert!(store.current_session().is_none());
    }

    #[test]
    fn test_accepts_camel_case_token_field() {
        let session: Session = serde_json::from_str(r#"{"apiToken": "abc"}"#).unwrap();
        assert_eq!(session.api_token, "abc");
    }

    #[test]
    fn test_display_name() {
        let mut session = sample_session();
        assert_eq!(session.display_name().as_deref(), Some("a@b.com"));

        session.first_name = Some("Ada".to_string());
        session.last_name = Some("Lovelace".to_string());
        assert_eq!(session.display_name().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_fixed_and_no_session() {
        assert!(NoSession.current_session().is_none());
        let fixed = FixedSession(Session::from_token("t"));
        assert_eq!(fixed.current_session().unwrap().api_token, "t");
    }
}
