//! Configuration management for Gamedex
//!
//! Holds the catalog API connection settings and the local persistence
//! settings. Values come from a TOML file, optionally layered with
//! `GAMEDEX_*` environment variables (`GAMEDEX_API__API_KEY`,
//! `GAMEDEX_STORAGE__BACKEND`, ...).

mod api_config;
mod storage_config;

pub use api_config::ApiConfig;
pub use storage_config::{StorageBackendKind, StorageConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "GAMEDEX";

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "gamedex.toml";

/// Main Gamedex configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamedexConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl GamedexConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from an optional file, then apply `GAMEDEX_*`
    /// environment overrides
    pub fn load_layered(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__");
        Self::build_layered(path, env)
    }

    fn build_layered(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) if path.exists() => {
                tracing::debug!("Reading configuration from {}", path.display());
                builder = builder.add_source(config::File::new(
                    &path.to_string_lossy(),
                    config::FileFormat::Toml,
                ));
            }
            Some(path) => {
                tracing::warn!(
                    "Configuration file {} not found, using defaults",
                    path.display()
                );
            }
            None => {}
        }

        let config: Self = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject settings the API client cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()));
        }
        if self.api.page_size == 0 {
            return Err(ConfigError::Invalid("api.page_size must be positive".into()));
        }
        if !self.api.has_api_key() {
            tracing::warn!("No API key configured, catalog requests will likely be rejected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_from(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .source(Some(map.into_iter().collect()))
    }

    #[test]
    fn test_default_config() {
        let config = GamedexConfig::default();
        assert_eq!(config.api.page_size, 20);
        assert_eq!(config.api.lang, "ru");
        assert_eq!(config.storage.backend, StorageBackendKind::File);
        assert!(!config.api.has_api_key());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_content = r#"
[api]
base_url = "http://localhost:9000/api"
api_key = "secret"
page_size = 40

[storage]
backend = "sqlite"
path = "/tmp/gamedex"
"#;
        write!(temp_file, "{}", config_content).unwrap();

        let config = GamedexConfig::load(temp_file.path()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000/api");
        assert_eq!(config.api.api_key, "secret");
        assert_eq!(config.api.page_size, 40);
        assert_eq!(config.api.lang, "ru");
        assert_eq!(config.storage.backend, StorageBackendKind::Sqlite);
        assert_eq!(
            config.storage.database_path(),
            PathBuf::from("/tmp/gamedex/gamedex.db")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = GamedexConfig::load(Path::new("/nonexistent/gamedex.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_save_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gamedex.toml");
        let mut config = GamedexConfig::default();
        config.api.api_key = "abc".into();

        config.save(&path).unwrap();

        let loaded = GamedexConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[api]\napi_key = \"from-file\"\npage_size = 10\n").unwrap();

        let env = env_from(&[
            ("GAMEDEX_API__API_KEY", "from-env"),
            ("GAMEDEX_STORAGE__BACKEND", "memory"),
        ]);
        let config = GamedexConfig::build_layered(Some(temp_file.path()), env).unwrap();

        assert_eq!(config.api.api_key, "from-env");
        assert_eq!(config.api.page_size, 10);
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
    }

    #[test]
    fn test_layered_without_file_uses_defaults() {
        let config = GamedexConfig::build_layered(None, env_from(&[])).unwrap();
        assert_eq!(config, GamedexConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = GamedexConfig::default();
        config.api.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = GamedexConfig::default();
        config.api.base_url = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(StorageBackendKind::Memory.as_str(), "memory");
        assert_eq!(StorageBackendKind::File.as_str(), "file");
        assert_eq!(StorageBackendKind::Sqlite.as_str(), "sqlite");
    }
}
