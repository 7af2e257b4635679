//! Backend connection settings
//!
//! Values come from the process environment (the binary loads `.env` first):
//! - `SCHOOL_API_BASE_URL` (required), e.g. `https://school.example/api/`
//! - `SCHOOL_API_TOKEN` (optional bearer token)
//! - `SCHOOL_API_TIMEOUT_SECS` (optional; the transport default applies when unset)
//! - `SCHOOL_API_USER_AGENT` (optional)

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

pub const BASE_URL_VAR: &str = "SCHOOL_API_BASE_URL";
pub const TOKEN_VAR: &str = "SCHOOL_API_TOKEN";
pub const TIMEOUT_VAR: &str = "SCHOOL_API_TIMEOUT_SECS";
pub const USER_AGENT_VAR: &str = "SCHOOL_API_USER_AGENT";

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("SchoolAdmin/", env!("CARGO_PKG_VERSION"));

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// Environment variable present but unusable
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Connection settings for the REST backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Root every resource path is resolved against
    pub base_url: String,
    /// Bearer token attached to every request
    pub token: Option<String>,
    /// Whole-request timeout; `None` leaves the transport default in place
    pub timeout: Option<Duration>,
    /// User-Agent header value
    pub user_agent: String,
}

impl ApiConfig {
    /// Settings for `base_url` with no token, no timeout and the default user agent
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Create the configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::EnvVarNotFound(BASE_URL_VAR.to_string()))?;

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                name: BASE_URL_VAR.to_string(),
                reason: format!("'{}' is not an http(s) URL", base_url),
            });
        }

        let token = lookup(TOKEN_VAR).filter(|value| !value.trim().is_empty());

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => {
                let seconds = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    name: TIMEOUT_VAR.to_string(),
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(seconds))
            }
            None => None,
        };

        let user_agent = lookup(USER_AGENT_VAR).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        info!(
            "API configuration: base_url={}, token={}, timeout={:?}",
            base_url,
            if token.is_some() { "set" } else { "unset" },
            timeout
        );

        Ok(Self {
            base_url,
            token,
            timeout,
            user_agent,
        })
    }
}
