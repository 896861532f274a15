//! Local persistence settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which key-value backend holds favorites and created games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Process memory, lost on exit
    Memory,
    /// One JSON file per key in a directory
    #[default]
    File,
    /// Single SQLite database file
    Sqlite,
}

impl StorageBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackendKind::Memory => "memory",
            StorageBackendKind::File => "file",
            StorageBackendKind::Sqlite => "sqlite",
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// Data directory
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

fn default_path() -> PathBuf {
    PathBuf::from("gamedex-data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            path: default_path(),
        }
    }
}

impl StorageConfig {
    /// Location of the SQLite database when the sqlite backend is selected
    pub fn database_path(&self) -> PathBuf {
        self.path.join("gamedex.db")
    }
}
