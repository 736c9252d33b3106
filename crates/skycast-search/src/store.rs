//! Persistent history store: durable backstop for recent searches.
//!
//! The store is read once at startup and written best-effort afterwards;
//! in-memory history stays authoritative while the process is alive.

use std::path::{Path, PathBuf};

use skycast_core::error::StorageError;

/// File name under the config directory holding the recent-search list.
const HISTORY_FILE: &str = "recent_searches.json";

/// Typed key-value contract for history persistence.
///
/// `load` must tolerate absence and malformed data by returning `None`
/// rather than failing hard (first run looks exactly like a wiped store).
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn load(&self) -> Option<Vec<String>>;
    async fn save(&self, entries: &[String]) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// JSON file implementation of `HistoryStore`.
///
/// Stores the full history as a pretty-printed JSON string array; every
/// save rewrites the whole file.
#[derive(Debug)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(HISTORY_FILE),
        }
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait::async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn load(&self) -> Option<Vec<String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read history file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(
                    "Malformed history file {}, ignoring: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    async fn save(&self, entries: &[String]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::WriteFailed {
                path: self.path_str(),
                message: e.to_string(),
            })?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|e| StorageError::WriteFailed {
            path: self.path_str(),
            message: e.to_string(),
        })?;

        std::fs::write(&self.path, json).map_err(|e| StorageError::WriteFailed {
            path: self.path_str(),
            message: e.to_string(),
        })?;

        tracing::debug!("Persisted {} recent searches", entries.len());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::RemoveFailed {
                path: self.path_str(),
                message: e.to_string(),
            }),
        }
    }
}
