//! Persisted session state
//!
//! One key-value slot holds the last-used assistant mode and the chat
//! transcript as a JSON blob. Backends only move strings around; the
//! [`SessionStore`] owns the format.

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{DataError, DataResult};

/// Format version written into every session blob
pub const SESSION_VERSION: u32 = 1;

/// Port for the local key-value slot
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> DataResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> DataResult<()>;

    fn remove(&self, key: &str) -> DataResult<()>;
}

/// Volatile backend, used in tests and when the data directory is unusable
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    slots: RwLock<AHashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> DataResult<Option<String>> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> DataResult<()> {
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> DataResult<()> {
        self.slots.write().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> DataResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(DataError::Config(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> DataResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> DataResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write then rename so a crash never leaves half a blob behind
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> DataResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The blob stored in the session slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u32,

    /// Last-used assistant mode name
    pub mode: String,

    /// Chat history, oldest first
    pub transcript: Vec<ChatEntry>,
}

impl Default for PersistedSession {
    fn default() -> Self {
        Self {
            version: SESSION_VERSION,
            mode: String::new(),
            transcript: Vec::new(),
        }
    }
}

/// Reads and writes [`PersistedSession`] through a key-value backend
pub struct SessionStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl SessionStore {
    pub fn new(backend: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn in_memory(key: impl Into<String>) -> Self {
        Self::new(Box::new(MemoryKeyValueStore::new()), key)
    }

    /// Stored session, or `None` when the slot is empty
    pub fn load(&self) -> DataResult<Option<PersistedSession>> {
        let Some(text) = self.backend.get(&self.key)? else {
            return Ok(None);
        };
        let session: PersistedSession = serde_json::from_str(&text)?;
        if session.version > SESSION_VERSION {
            return Err(DataError::Config(format!(
                "session version {} is newer than supported {}",
                session.version, SESSION_VERSION
            )));
        }
        debug!(key = %self.key, entries = session.transcript.len(), "session loaded");
        Ok(Some(session))
    }

    /// Like [`SessionStore::load`] but never fails: unreadable state is
    /// logged and replaced by an empty session
    pub fn load_or_default(&self) -> PersistedSession {
        match self.load() {
            Ok(Some(session)) => session,
            Ok(None) => {
                info!(key = %self.key, "no stored session");
                PersistedSession::default()
            }
            Err(e) => {
                warn!(key = %self.key, "discarding unreadable session: {}", e);
                PersistedSession::default()
            }
        }
    }

    pub fn save(&self, session: &PersistedSession) -> DataResult<()> {
        let text = serde_json::to_string(session)?;
        self.backend.set(&self.key, &text)?;
        debug!(key = %self.key, entries = session.transcript.len(), "session saved");
        Ok(())
    }

    pub fn clear(&self) -> DataResult<()> {
        self.backend.remove(&self.key)
    }
}
