// Runtime configuration.
// Read from GHDASH_-prefixed environment variables, optionally seeded from a .env file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DashError, Result};

pub const ENV_PREFIX: &str = "GHDASH_";

const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "ghdash";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Base URL of the GitHub REST API, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Freshness window for cached responses.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Upper bound on a single outbound request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of cached responses (unbounded when unset).
    #[serde(default)]
    pub cache_capacity: Option<usize>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_capacity: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load from the process environment, reading `./.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load from a `.env`-style file without touching the process environment.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let iter = dotenv::from_path_iter(path)
            .map_err(|e| DashError::Config(format!("{}: {}", path.display(), e)))?;
        let vars = iter
            .collect::<std::result::Result<Vec<(String, String)>, _>>()
            .map_err(|e| DashError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_vars(vars)
    }

    /// Build from key/value pairs; only `GHDASH_`-prefixed keys are considered.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(|e| DashError::Config(e.to_string()))?;
        config.validate()
    }

    /// Normalize and check invariants.
    pub fn validate(mut self) -> Result<Self> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(DashError::Config("api_base_url must not be empty".into()));
        }
        self.api_base_url = trimmed.to_string();

        if self.request_timeout_secs == 0 {
            return Err(DashError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(self)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_vars(vars(&[("PATH", "/usr/bin")])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ttl(), Duration::from_secs(300));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_prefixed_overrides() {
        let config = Config::from_vars(vars(&[
            ("GHDASH_API_BASE_URL", "http://localhost:8080/"),
            ("GHDASH_CACHE_TTL_SECS", "60"),
            ("GHDASH_CACHE_CAPACITY", "128"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.cache_capacity, Some(128));
        assert_eq!(config.user_agent, "ghdash");
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = Config::from_vars(vars(&[("GHDASH_CACHE_TTL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, DashError::Config(_)));

        let err = Config::from_vars(vars(&[("GHDASH_API_BASE_URL", "  ")])).unwrap_err();
        assert!(matches!(err, DashError::Config(_)));

        let err =
            Config::from_vars(vars(&[("GHDASH_REQUEST_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, DashError::Config(_)));
    }

    #[test]
    fn test_from_env_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "GHDASH_CACHE_TTL_SECS=30").unwrap();
        writeln!(file, "GHDASH_USER_AGENT=dashboard-test").unwrap();

        let config = Config::from_env_file(file.path()).unwrap();
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.user_agent, "dashboard-test");
    }

    #[test]
    fn test_missing_env_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = Config::from_env_file(&dir.path().join("absent.env")).unwrap_err();
        assert!(matches!(err, DashError::Config(_)));
    }
}
