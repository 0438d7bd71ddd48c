//! Validator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ValidatorError;

/// Environment variable holding the `|`-separated issuer allow-list
pub const ENV_ISS_WHITELIST: &str = "ISS_WHITELIST";
/// Environment variable overriding the key cache max age, in seconds
pub const ENV_CACHE_MAX_AGE_SECS: &str = "AUTHENTIC_CACHE_MAX_AGE_SECS";
/// Environment variable overriding the HTTP request timeout, in seconds
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AUTHENTIC_REQUEST_TIMEOUT_SECS";

/// Validator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Issuers whose tokens are accepted. Empty accepts any issuer.
    /// Compared with the unverified `iss` claim by exact string match.
    #[serde(default)]
    pub issuer_whitelist: Vec<String>,

    /// Seconds after which a cached key is refreshed on next use.
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: u64,

    /// Timeout for each discovery or JWKS request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_cache_max_age() -> u64 {
    10 * 60 * 60 // 10 hours
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            issuer_whitelist: Vec::new(),
            cache_max_age_secs: default_cache_max_age(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from the process environment
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Config`] if a numeric variable does not parse
    /// or the resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ValidatorError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(whitelist) = lookup(ENV_ISS_WHITELIST) {
            config.issuer_whitelist = parse_whitelist(&whitelist);
        }
        if let Some(secs) = lookup(ENV_CACHE_MAX_AGE_SECS) {
            config.cache_max_age_secs = parse_secs(ENV_CACHE_MAX_AGE_SECS, &secs)?;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_secs(ENV_REQUEST_TIMEOUT_SECS, &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Config`] when the request timeout is zero or
    /// an allow-listed issuer is blank.
    pub fn validate(&self) -> Result<(), ValidatorError> {
        if self.request_timeout_secs == 0 {
            return Err(ValidatorError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.issuer_whitelist.iter().any(|iss| iss.trim().is_empty()) {
            return Err(ValidatorError::Config(
                "issuer_whitelist must not contain blank entries".to_string(),
            ));
        }
        Ok(())
    }

    /// Key cache max age
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_whitelist(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|iss| !iss.is_empty())
        .map(String::from)
        .collect()
}

fn parse_secs(name: &str, raw: &str) -> Result<u64, ValidatorError> {
    raw.trim()
        .parse()
        .map_err(|e| ValidatorError::Config(format!("{name} must be a number of seconds: {e}")))
}
