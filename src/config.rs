//! Construction-time settings for one selector instance.
//!
//! Values come from the environment (with `.env` support) or from a TOML
//! file. The section id scopes a host's element ids so several selectors can
//! live on the same page.

use crate::fields::FieldKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const SECTION_ID_VAR: &str = "FITMENT_SECTION_ID";
pub const API_URL_VAR: &str = "FITMENT_API_URL";
pub const API_TOKEN_VAR: &str = "FITMENT_API_TOKEN";
pub const REQUEST_TIMEOUT_VAR: &str = "FITMENT_REQUEST_TIMEOUT_SECS";

const ELEMENT_PREFIX: &str = "vehicle-search";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variables: {0}")]
    MissingVars(String),

    #[error("Invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmitLabels {
    pub idle: String,
    pub busy: String,
}

impl Default for SubmitLabels {
    fn default() -> Self {
        Self {
            idle: "Find Parts".to_string(),
            busy: "Finding...".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub section_id: String,
    pub api_url: String,
    pub api_token: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub labels: SubmitLabels,
}

impl SelectorConfig {
    pub fn new(
        section_id: impl Into<String>,
        api_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            section_id: section_id.into(),
            api_url: api_url.into(),
            api_token: api_token.into(),
            request_timeout_secs: None,
            labels: SubmitLabels::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads `.env` if present, then reads the `FITMENT_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_err() {
            info!("No .env file found, using process environment");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any variable source. Every missing required
    /// variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = [SECTION_ID_VAR, API_URL_VAR, API_TOKEN_VAR];
        let values = required.map(|key| lookup(key).filter(|v| !v.trim().is_empty()));
        let (section_id, api_url, api_token) = match values {
            [Some(section_id), Some(api_url), Some(api_token)] => (section_id, api_url, api_token),
            values => {
                let missing: Vec<&str> = required
                    .iter()
                    .zip(&values)
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| *key)
                    .collect();
                return Err(ConfigError::MissingVars(missing.join(", ")));
            }
        };

        let request_timeout_secs = match lookup(REQUEST_TIMEOUT_VAR) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                warn!("Invalid {REQUEST_TIMEOUT_VAR} value: {e}");
                ConfigError::InvalidValue {
                    key: REQUEST_TIMEOUT_VAR.to_string(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let config = Self {
            section_id,
            api_url,
            api_token,
            request_timeout_secs,
            labels: SubmitLabels::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                url: self.api_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        for (key, value) in [("section_id", &self.section_id), ("api_token", &self.api_token)] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// No timeout unless one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Element id a host uses for `kind`, e.g. `vehicle-search-year-main`.
    pub fn field_element_id(&self, kind: FieldKind) -> String {
        format!("{}-{}-{}", ELEMENT_PREFIX, kind.name(), self.section_id)
    }

    pub fn submit_element_id(&self) -> String {
        format!("{}-submit-{}", ELEMENT_PREFIX, self.section_id)
    }
}
