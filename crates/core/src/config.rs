use crate::vocabulary::{ACTIVATE, INSTALL, STORE_CLICK};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `ADFUNNEL__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ads_api: AdsApiConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Clone, Deserialize)]
pub struct AdsApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub access_token: String,
}

// Hand-written so the token never reaches a log line through `{:?}`.
impl std::fmt::Debug for AdsApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdsApiConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout_ms", &self.timeout_ms)
            .field("access_token", &"***")
            .finish()
    }
}

/// Extra action types per category. Entries extend the built-in vocabulary,
/// they never replace it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    #[serde(default = "default_sample_max_chars")]
    pub sample_max_chars: usize,
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
}

// Default functions
fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_api_version() -> String {
    "v19.0".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_sample_max_chars() -> usize {
    120
}
fn default_max_requests() -> usize {
    2
}

impl Default for AdsApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_ms: default_timeout_ms(),
            access_token: String::new(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            sample_max_chars: default_sample_max_chars(),
            max_requests: default_max_requests(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ads_api: AdsApiConfig::default(),
            vocabulary: VocabularyConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then environment
    /// variables (which win).
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_prefix(file, "ADFUNNEL")
    }

    fn load_with_prefix(file: Option<&Path>, prefix: &str) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let builder = builder.add_source(environment(prefix));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

/// Environment source. Only the built-in vocabulary categories are split on
/// `,`; every other variable stays a plain string so tokens and URLs load
/// as-is.
fn environment(prefix: &str) -> config::Environment {
    let mut env = config::Environment::with_prefix(prefix)
        .separator("__")
        .try_parsing(true)
        .list_separator(",");
    for category in [STORE_CLICK, INSTALL, ACTIVATE] {
        env = env.with_list_parse_key(&format!("vocabulary.categories.{category}"));
    }
    env
}
