//! Remote catalog API settings

use serde::{Deserialize, Serialize};

/// Connection settings for the RAWG-compatible catalog API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without a trailing `/games`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent as the `key` query parameter
    #[serde(default)]
    pub api_key: String,

    /// Response language sent as the `lang` query parameter
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Number of games requested per catalog page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.rawg.io/api".to_string()
}

fn default_lang() -> String {
    "ru".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            lang: default_lang(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Whether an API key has been configured
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
