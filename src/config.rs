use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL_VAR: &str = "AQAAR_BASE_URL";
const TIMEOUT_VAR: &str = "AQAAR_TIMEOUT_MS";
const PAGE_SIZE_VAR: &str = "AQAAR_PAGE_SIZE";

/// Connection settings for the listings API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Root URL every endpoint path is appended to
    pub base_url: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Page size used when the caller does not pick one
    pub default_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://backend.aqaar.dussur.sa/api".to_string(),
            timeout_ms: 10_000,
            default_page_size: 10,
        }
    }
}

impl Config {
    /// Load settings from the process environment, reading a `.env` file first
    /// if one is present. Unset variables keep their defaults.
    pub fn from_env() -> ApiResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_VAR) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.timeout_ms = raw
                .trim()
                .parse()
                .map_err(|_| ApiError::Config(format!("{TIMEOUT_VAR} must be an integer, got {raw:?}")))?;
        }
        if let Some(raw) = lookup(PAGE_SIZE_VAR) {
            config.default_page_size = raw
                .trim()
                .parse()
                .map_err(|_| ApiError::Config(format!("{PAGE_SIZE_VAR} must be an integer, got {raw:?}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::Config("base url is empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ApiError::Config("timeout must be positive".into()));
        }
        if self.default_page_size == 0 {
            return Err(ApiError::Config("default page size must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
