//! Runtime configuration from the environment.
//!
//! Deployments configure the scanner through environment variables,
//! optionally seeded from `.env` and `.env.local` files:
//! - `REDIS_URL` — queue broker address, required
//! - `GITHUB_TOKEN` — host API credential, optional
//! - `TEMP_DIR` — clone workspace root, defaults to the system temp dir
//! - `CLONE_TIMEOUT` — shallow-clone timeout in milliseconds
//! - `QUEUE_CONCURRENCY` — worker pool size

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;

pub const DEFAULT_CLONE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Debug, Clone)]
pub struct Config {
    /// Queue broker address. The in-process queue does not dial it, but
    /// deployments point this at the durable broker and startup must fail
    /// fast when it is missing.
    pub broker_url: String,
    /// Host API credential; requests go unauthenticated when absent.
    pub github_token: Option<String>,
    /// Root directory for clone workspaces.
    pub temp_dir: PathBuf,
    /// Shallow-clone timeout.
    pub clone_timeout: Duration,
    /// Worker pool size.
    pub concurrency: usize,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let broker_url = match get("REDIS_URL") {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Err(ConfigError::MissingBrokerUrl),
        };
        let github_token = get("GITHUB_TOKEN").filter(|token| !token.is_empty());
        let temp_dir = get("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let clone_timeout_ms = parse_value(
            "CLONE_TIMEOUT",
            get("CLONE_TIMEOUT"),
            DEFAULT_CLONE_TIMEOUT_MS,
        )?;
        let concurrency = parse_value(
            "QUEUE_CONCURRENCY",
            get("QUEUE_CONCURRENCY"),
            DEFAULT_CONCURRENCY,
        )?;

        Ok(Self {
            broker_url,
            github_token,
            temp_dir,
            clone_timeout: Duration::from_millis(clone_timeout_ms),
            concurrency,
        })
    }
}

fn parse_value<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

/// Load `.env` then `.env.local`. Absent files are fine, and variables
/// already present in the process environment always win.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_filename(".env.local");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_broker_url_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBrokerUrl));
    }

    #[test]
    fn empty_broker_url_is_fatal() {
        let err = Config::from_lookup(lookup(&[("REDIS_URL", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingBrokerUrl));
    }

    #[test]
    fn defaults_apply_when_only_broker_url_is_set() {
        let config =
            Config::from_lookup(lookup(&[("REDIS_URL", "redis://localhost:6379")])).unwrap();
        assert_eq!(config.broker_url, "redis://localhost:6379");
        assert_eq!(config.github_token, None);
        assert_eq!(config.temp_dir, std::env::temp_dir());
        assert_eq!(config.clone_timeout, Duration::from_millis(30_000));
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("REDIS_URL", "redis://broker:6379"),
            ("GITHUB_TOKEN", "ghp_example"),
            ("TEMP_DIR", "/var/scans"),
            ("CLONE_TIMEOUT", "5000"),
            ("QUEUE_CONCURRENCY", "8"),
        ]))
        .unwrap();
        assert_eq!(config.github_token.as_deref(), Some("ghp_example"));
        assert_eq!(config.temp_dir, PathBuf::from("/var/scans"));
        assert_eq!(config.clone_timeout, Duration::from_millis(5_000));
        assert_eq!(config.concurrency, 8);
    }

    #[test]
    fn invalid_clone_timeout_is_fatal() {
        let err = Config::from_lookup(lookup(&[
            ("REDIS_URL", "redis://localhost:6379"),
            ("CLONE_TIMEOUT", "soon"),
        ]))
        .unwrap_err();
        match err {
            ConfigError::InvalidValue { name, value } => {
                assert_eq!(name, "CLONE_TIMEOUT");
                assert_eq!(value, "soon");
            }
            _ => panic!("Expected InvalidValue"),
        }
    }

    #[test]
    fn invalid_concurrency_is_fatal() {
        let err = Config::from_lookup(lookup(&[
            ("REDIS_URL", "redis://localhost:6379"),
            ("QUEUE_CONCURRENCY", "-1"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "QUEUE_CONCURRENCY",
                ..
            }
        ));
    }

    #[test]
    fn empty_github_token_is_treated_as_absent() {
        let config = Config::from_lookup(lookup(&[
            ("REDIS_URL", "redis://localhost:6379"),
            ("GITHUB_TOKEN", ""),
        ]))
        .unwrap();
        assert_eq!(config.github_token, None);
    }
}
