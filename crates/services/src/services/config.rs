//! Runtime configuration read from the environment.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

pub const API_URL_VAR: &str = "API_URL";
pub const SESSION_FILE_VAR: &str = "DASHBOARD_SESSION_FILE";
pub const HTTP_TIMEOUT_VAR: &str = "DASHBOARD_HTTP_TIMEOUT_SECS";
pub const CACHE_TTL_VAR: &str = "DASHBOARD_CACHE_TTL_SECS";
pub const CACHE_CAPACITY_VAR: &str = "DASHBOARD_CACHE_CAPACITY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid API_URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("could not determine a data directory for the session file; set DASHBOARD_SESSION_FILE")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Root of the content API; requests go to `{api_url}/api/...`
    pub api_url: Url,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl DashboardConfig {
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
    pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

    pub fn new(api_url: Url, session_file: PathBuf) -> Self {
        Self {
            api_url,
            session_file,
            http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(API_URL_VAR))?;
        let api_url = Url::parse(api_url.trim())?;

        let session_file = match lookup(SESSION_FILE_VAR).filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => utils::assets::session_file().ok_or(ConfigError::NoDataDir)?,
        };

        let mut config = Self::new(api_url, session_file);
        if let Some(secs) = parse_number(&lookup, HTTP_TIMEOUT_VAR)? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_number(&lookup, CACHE_TTL_VAR)? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse_number(&lookup, CACHE_CAPACITY_VAR)? {
            config.cache_capacity = capacity;
        }
        Ok(config)
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
