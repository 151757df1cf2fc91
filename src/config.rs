use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENROUTER_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-001";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DB: &str = "buildit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")] Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")] Invalid { key: &'static str, value: String },
}

/// Credentials and endpoint for one text-generation provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub database: String,
    pub gemini: Option<ProviderSettings>,
    pub openrouter: Option<ProviderSettings>,
    pub provider_timeout: Duration,
    pub port: u16,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mongodb_uri = get("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?;
        let database = get("MONGODB_DB").unwrap_or_else(|| DEFAULT_DB.to_string());

        let gemini = get("GEMINI_API_KEY").map(|api_key| ProviderSettings {
            api_key,
            base_url: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_BASE.to_string()),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        });
        let openrouter = get("OPENROUTER_API_KEY").map(|api_key| ProviderSettings {
            api_key,
            base_url: get("OPENROUTER_API_BASE").unwrap_or_else(|| DEFAULT_OPENROUTER_BASE.to_string()),
            model: get("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
        });

        let timeout_secs = match get("PROVIDER_TIMEOUT_SECS") {
            Some(v) => v.trim().parse::<u64>().ok().filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid { key: "PROVIDER_TIMEOUT_SECS", value: v })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let port = match get("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::Invalid { key: "PORT", value: v })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            mongodb_uri,
            database,
            gemini,
            openrouter,
            provider_timeout: Duration::from_secs(timeout_secs),
            port,
        })
    }
}
