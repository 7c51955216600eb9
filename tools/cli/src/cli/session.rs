//! Where the bearer token and admin flag live between invocations.

use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

#[cfg(target_family = "unix")]
use libc::umask;
use recipes_proto::constants::{SESSION_KEY_AUTH_TOKEN, SESSION_KEY_IS_ADMIN};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unable to read session store {path} - {reason}")]
    Read { path: String, reason: String },
    #[error("unable to write session store {path} - {reason}")]
    Write { path: String, reason: String },
}

/// Key/value storage scoped to the user's session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Forget every key.
    fn clear(&self) -> Result<(), SessionError>;
}

/// What a page needs to know about the session. Read once when the page is
/// constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<String>,
    pub is_admin: bool,
}

impl SessionContext {
    pub fn load(store: &dyn SessionStore) -> Result<Self, SessionError> {
        let token = store
            .get(SESSION_KEY_AUTH_TOKEN)?
            .filter(|t| !t.is_empty());
        let is_admin = store.get(SESSION_KEY_IS_ADMIN)?.as_deref() == Some("true");
        Ok(SessionContext { token, is_admin })
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }
}

/// A session store that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let mut values = BTreeMap::new();
        values.insert(SESSION_KEY_AUTH_TOKEN.to_string(), token.to_string());
        MemorySessionStore {
            values: Mutex::new(values),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.clear();
        Ok(())
    }
}

/// A session store persisted as a flat json object.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// `path` may start with `~`.
    pub fn new(path: &str) -> Self {
        FileSessionStore {
            path: PathBuf::from(shellexpand::tilde(path).into_owned()),
        }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        if !self.path.exists() {
            debug!(
                "Session store {:?} does not exist, returning an empty session.",
                self.path
            );
            return Ok(BTreeMap::new());
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                return match e.kind() {
                    // we bail here because you won't be able to write it back...
                    ErrorKind::PermissionDenied => {
                        error!("Permission denied reading session store {:?}", self.path);
                        Err(SessionError::Read {
                            path: self.display_path(),
                            reason: e.to_string(),
                        })
                    }
                    // other errors are OK to continue past
                    _ => {
                        warn!(
                            "Cannot read session from {} due to error: {:?} ... continuing.",
                            self.path.display(),
                            e
                        );
                        Ok(BTreeMap::new())
                    }
                };
            }
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            warn!("JSON/IO error reading session from {:?} -> {:?}", self.path, e);
            SessionError::Read {
                path: self.display_path(),
                reason: e.to_string(),
            }
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let write_err = |reason: String| SessionError::Write {
            path: self.display_path(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent).map_err(|e| {
                    error!("Unable to create directory - {} {:?}", parent.display(), e);
                    write_err(e.to_string())
                })?;
            }
        }

        // Take away group/everyone read/write
        #[cfg(target_family = "unix")]
        let before = unsafe { umask(0o177) };

        let file = File::create(&self.path).map_err(|e| {
            #[cfg(target_family = "unix")]
            let _ = unsafe { umask(before) };
            error!("Can not write to {} -> {:?}", self.path.display(), e);
            write_err(e.to_string())
        })?;

        #[cfg(target_family = "unix")]
        let _ = unsafe { umask(before) };

        serde_json::to_writer_pretty(BufWriter::new(file), values).map_err(|e| {
            error!(
                "JSON/IO error writing session to file {:?} -> {:?}",
                self.path, e
            );
            write_err(e.to_string())
        })
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn clear(&self) -> Result<(), SessionError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write_all(&BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_flag_requires_exact_true() {
        let store = MemorySessionStore::with_token("abc");
        for (stored, expect) in [("true", true), ("TRUE", false), ("1", false), ("", false)] {
            store
                .set(SESSION_KEY_IS_ADMIN, stored)
                .expect("memory store failed");
            let ctx = SessionContext::load(&store).expect("memory store failed");
            assert_eq!(ctx.is_admin, expect, "stored value {:?}", stored);
            assert_eq!(ctx.token.as_deref(), Some("abc"));
        }
    }

    #[test]
    fn test_empty_token_is_no_token() {
        let store = MemorySessionStore::with_token("");
        let ctx = SessionContext::load(&store).expect("memory store failed");
        assert!(!ctx.is_logged_in());
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemorySessionStore::with_token("abc");
        store.clear().expect("memory store failed");
        assert_eq!(
            SessionContext::load(&store).expect("memory store failed"),
            SessionContext::default()
        );
    }

    #[test]
    fn test_file_store_roundtrip_and_keys() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("nested").join("session");
        let store = FileSessionStore::new(path.to_str().expect("tempdir is not utf8"));

        // Missing file reads as an empty session.
        assert!(!SessionContext::load(&store)
            .expect("read failed")
            .is_logged_in());

        store
            .set(SESSION_KEY_AUTH_TOKEN, "abc")
            .expect("write failed");
        store.set(SESSION_KEY_IS_ADMIN, "true").expect("write failed");

        let raw = std::fs::read_to_string(&path).expect("session file missing");
        let json: BTreeMap<String, String> = serde_json::from_str(&raw).expect("not json");
        assert_eq!(json.get("auth-token").map(String::as_str), Some("abc"));
        assert_eq!(json.get("is-admin").map(String::as_str), Some("true"));

        // A second store on the same path sees the same session.
        let reopened = FileSessionStore::new(path.to_str().expect("tempdir is not utf8"));
        let ctx = SessionContext::load(&reopened).expect("read failed");
        assert_eq!(ctx.token.as_deref(), Some("abc"));
        assert!(ctx.is_admin);

        reopened.clear().expect("clear failed");
        assert_eq!(
            SessionContext::load(&store).expect("read failed"),
            SessionContext::default()
        );
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("session");
        std::fs::write(&path, "not json").expect("failed to write");
        let store = FileSessionStore::new(path.to_str().expect("tempdir is not utf8"));
        assert!(matches!(
            store.get(SESSION_KEY_AUTH_TOKEN),
            Err(SessionError::Read { .. })
        ));
    }
}
