//! Local persistence for Gamedex
//!
//! Favorites and user-created games are stored as JSON strings under a few
//! fixed keys. This crate only knows about strings: the [`KeyValueStore`]
//! trait and three backends for it.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process memory, clones share one map
//! - [`FileStore`]: one `<key>.json` file per key, atomic replace on write
//! - [`SqliteStore`]: a single `kv` table

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use gamedex_config::{StorageBackendKind, StorageConfig};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Data directory not found: {0}")]
    PathNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// String-keyed, string-valued persistent store
///
/// Implementations are shared behind `Arc` by both stores of the library,
/// which write under disjoint keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`; deleting an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys are used as file names by [`FileStore`], so all backends accept the
/// same conservative alphabet.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Open the backend selected by the configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    tracing::info!(
        "Opening {} storage at {}",
        config.backend.as_str(),
        config.path.display()
    );

    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackendKind::Memory => Arc::new(MemoryStore::new()),
        StorageBackendKind::File => Arc::new(FileStore::open(&config.path)?),
        StorageBackendKind::Sqlite => {
            std::fs::create_dir_all(&config.path)?;
            Arc::new(SqliteStore::open(config.database_path())?)
        }
    };

    Ok(store)
}
