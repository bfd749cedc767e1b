//! Environment-derived configuration.
//!
//! Every setting has a default, so an empty environment yields a working
//! offline setup: mock API, memory-only storage.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::assets::DEFAULT_KEEP_IMAGES;
use crate::engine::DEFAULT_QUOTA;
use crate::mock::DEFAULT_LATENCY;
use crate::{Error, Result};

pub const ENV_USE_MOCK_API: &str = "PORTFOLIO_USE_MOCK_API";
pub const ENV_API_URL: &str = "PORTFOLIO_API_URL";
pub const ENV_DATA_DIR: &str = "PORTFOLIO_DATA_DIR";
pub const ENV_STORAGE_QUOTA: &str = "PORTFOLIO_STORAGE_QUOTA";
pub const ENV_MOCK_LATENCY_MS: &str = "PORTFOLIO_MOCK_LATENCY_MS";
pub const ENV_HTTP_TIMEOUT_MS: &str = "PORTFOLIO_HTTP_TIMEOUT_MS";
pub const ENV_HTTP_RETRIES: &str = "PORTFOLIO_HTTP_RETRIES";
pub const ENV_HTTP_BACKOFF_MS: &str = "PORTFOLIO_HTTP_BACKOFF_MS";
pub const ENV_READ_FALLBACK: &str = "PORTFOLIO_READ_FALLBACK";
pub const ENV_KEEP_IMAGES: &str = "PORTFOLIO_KEEP_IMAGES";
pub const ENV_PORT: &str = "PORTFOLIO_PORT";
pub const ENV_ADMIN_EMAIL: &str = "PORTFOLIO_ADMIN_EMAIL";
pub const ENV_ADMIN_PASSWORD: &str = "PORTFOLIO_ADMIN_PASSWORD";

/// Port the content server listens on when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Timeout and retry settings for the remote HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    /// The n-th retry waits `n * retry_backoff`.
    pub retry_backoff: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub use_mock_api: bool,
    pub api_base_url: String,
    /// `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub storage_quota: usize,
    pub mock_latency: Duration,
    pub http: HttpConfig,
    pub read_fallback: bool,
    pub keep_images: usize,
    /// Listen port of `portfolio-served`.
    pub port: u16,
    /// Account `portfolio-served` creates on start when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_mock_api: true,
            api_base_url: "http://localhost:8080".to_string(),
            data_dir: None,
            storage_quota: DEFAULT_QUOTA,
            mock_latency: DEFAULT_LATENCY,
            http: HttpConfig::default(),
            read_fallback: true,
            keep_images: DEFAULT_KEEP_IMAGES,
            port: DEFAULT_PORT,
            admin_email: None,
            admin_password: None,
        }
    }
}

pub fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{} must be a boolean, got {:?}", name, other))),
    }
}

fn parse_num<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", name, raw)))
}

impl Config {
    /// Reads the process environment over [`Config::default`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_USE_MOCK_API) {
            config.use_mock_api = parse_bool(ENV_USE_MOCK_API, &v)?;
        }
        if let Some(v) = get(ENV_API_URL) {
            config.api_base_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get(ENV_DATA_DIR) {
            config.data_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_STORAGE_QUOTA) {
            config.storage_quota = parse_num(ENV_STORAGE_QUOTA, &v)?;
        }
        if let Some(v) = get(ENV_MOCK_LATENCY_MS) {
            config.mock_latency = Duration::from_millis(parse_num(ENV_MOCK_LATENCY_MS, &v)?);
        }
        if let Some(v) = get(ENV_HTTP_TIMEOUT_MS) {
            config.http.timeout = Duration::from_millis(parse_num(ENV_HTTP_TIMEOUT_MS, &v)?);
        }
        if let Some(v) = get(ENV_HTTP_RETRIES) {
            config.http.max_retries = parse_num(ENV_HTTP_RETRIES, &v)?;
        }
        if let Some(v) = get(ENV_HTTP_BACKOFF_MS) {
            config.http.retry_backoff = Duration::from_millis(parse_num(ENV_HTTP_BACKOFF_MS, &v)?);
        }
        if let Some(v) = get(ENV_READ_FALLBACK) {
            config.read_fallback = parse_bool(ENV_READ_FALLBACK, &v)?;
        }
        if let Some(v) = get(ENV_KEEP_IMAGES) {
            config.keep_images = parse_num(ENV_KEEP_IMAGES, &v)?;
        }
        if let Some(v) = get(ENV_PORT) {
            config.port = parse_num(ENV_PORT, &v)?;
        }
        config.admin_email = get(ENV_ADMIN_EMAIL).map(|v| v.trim().to_string());
        config.admin_password = get(ENV_ADMIN_PASSWORD);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_empty_environment_is_default() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_USE_MOCK_API, "false"),
            (ENV_API_URL, "https://api.example.com/"),
            (ENV_HTTP_RETRIES, "5"),
            (ENV_MOCK_LATENCY_MS, "0"),
            (ENV_KEEP_IMAGES, "10"),
        ]))
        .unwrap();
        assert!(!config.use_mock_api);
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.http.max_retries, 5);
        assert_eq!(config.mock_latency, Duration::ZERO);
        assert_eq!(config.keep_images, 10);
    }

    #[test]
    fn test_server_settings() {
        let config = Config::from_lookup(lookup(&[
            (ENV_PORT, "9090"),
            (ENV_STORAGE_QUOTA, "1048576"),
            (ENV_ADMIN_EMAIL, " admin@example.com "),
            (ENV_ADMIN_PASSWORD, "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.storage_quota, 1048576);
        assert_eq!(config.admin_email.as_deref(), Some("admin@example.com"));
        assert_eq!(config.admin_password.as_deref(), Some("s3cret"));

        let err = Config::from_lookup(lookup(&[(ENV_PORT, "99999")])).unwrap_err();
        assert!(err.to_string().contains(ENV_PORT));
    }

    #[test]
    fn test_malformed_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[(ENV_USE_MOCK_API, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(ENV_USE_MOCK_API));

        let err = Config::from_lookup(lookup(&[(ENV_STORAGE_QUOTA, "lots")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
