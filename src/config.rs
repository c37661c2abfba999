use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat";
pub const ENDPOINT_ENV: &str = "CHAT_ENDPOINT";
pub const TIMEOUT_ENV: &str = "CHAT_TIMEOUT_SECS";

pub const DEFAULT_AGENT_NAME: &str = "broski";
pub const DEFAULT_GREETING: &str = "hey, how can I help you today?";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid endpoint URL '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported endpoint scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("invalid timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Runtime settings for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub endpoint: Url,
    /// `None` leaves an exchange free to hang until the transport gives up.
    pub timeout: Option<Duration>,
    pub agent_name: String,
    pub greeting: String,
}

impl ChatConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: None,
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }

    /// Resolves settings from CLI flags, then the environment, then defaults.
    pub fn resolve(endpoint: Option<&str>, timeout_secs: Option<u64>) -> Result<Self, ConfigError> {
        Self::resolve_with(endpoint, timeout_secs, |key| env::var(key).ok())
    }

    fn resolve_with(
        endpoint: Option<&str>,
        timeout_secs: Option<u64>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let endpoint = match endpoint {
            Some(value) => parse_endpoint(value)?,
            None => match lookup(ENDPOINT_ENV) {
                Some(value) => parse_endpoint(&value)?,
                None => parse_endpoint(DEFAULT_ENDPOINT)?,
            },
        };

        let timeout = match timeout_secs {
            Some(0) => return Err(ConfigError::InvalidTimeout("0".to_string())),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => lookup(TIMEOUT_ENV).map(|value| parse_timeout(&value)).transpose()?,
        };

        debug!("Using endpoint {} (timeout: {:?})", endpoint, timeout);

        Ok(Self {
            timeout,
            ..Self::new(endpoint)
        })
    }
}

pub fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidEndpoint {
        value: value.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

pub fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(value.to_string())),
    }
}
