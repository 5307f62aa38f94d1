//! Connection settings for the grading API.
//!
//! Credentials are injected into whatever performs the fetches instead of
//! living in module-level constants, so tests can point the client at fake
//! endpoints with fake keys.

use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://spark-se-assessment-api.azurewebsites.net/api";
pub const DEFAULT_SEMESTER: &str = "fall2022";

pub const ENV_BASE_URL: &str = "GRADEBOOK_API_URL";
pub const ENV_API_KEY: &str = "GRADEBOOK_API_KEY";
pub const ENV_BUID: &str = "GRADEBOOK_BUID";
pub const ENV_TIMEOUT_SECS: &str = "GRADEBOOK_TIMEOUT_SECS";
pub const ENV_CONCURRENCY: &str = "GRADEBOOK_CONCURRENCY";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Shared secret sent as the `x-functions-key` header.
    pub api_key: String,
    /// Caller id appended to every request as `?buid=`.
    pub buid: String,
    pub timeout: Duration,
    /// Upper bound on in-flight per-student grade fetches.
    pub concurrency: usize,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>, buid: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            buid: buid.into(),
            timeout: Duration::from_secs(30),
            concurrency: 5,
        }
    }

    /// Reads the config from process environment variables.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get(ENV_API_KEY).ok_or(ConfigError::Missing(ENV_API_KEY))?;
        let buid = get(ENV_BUID).ok_or(ConfigError::Missing(ENV_BUID))?;
        let mut config = Self::new(api_key, buid);

        if let Some(url) = get(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(parse_positive(ENV_TIMEOUT_SECS, &raw)? as u64);
        }
        if let Some(raw) = get(ENV_CONCURRENCY) {
            config.concurrency = parse_positive(ENV_CONCURRENCY, &raw)?;
        }

        Ok(config)
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason,
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be greater than zero".to_string())),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(e.to_string())),
    }
}
