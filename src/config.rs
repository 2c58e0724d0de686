//! Runtime configuration
//!
//! Defaults come from [`crate::constants`]; each can be overridden through
//! the environment (a `.env` file is loaded first when present):
//!
//! - `PROXY_LISTEN_ADDR` — socket address to bind, default `0.0.0.0:8080`
//! - `PROXY_UPSTREAM_BASE_URL` — CoinGecko API base URL
//! - `PROXY_REQUEST_TIMEOUT_MS` — per-attempt upstream timeout
//! - `PROXY_CACHE_TTL_SECS` — freshness window of cached bodies
//! - `PROXY_LOG_FORMAT` — `text` (default) or `json`

use crate::{
    constants::{CACHE_TTL_SECS, COINGECKO_API_URL, DEFAULT_LISTEN_ADDR, REQUEST_TIMEOUT_SECS},
    error::ConfigError,
};
use std::{net::SocketAddr, str::FromStr, time::Duration};

/// Log output format of the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else if s.eq_ignore_ascii_case("text") {
            Ok(LogFormat::Text)
        } else {
            Err(())
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub upstream_base_url: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR,
            upstream_base_url: COINGECKO_API_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Loads configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = match lookup("PROXY_LISTEN_ADDR") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("PROXY_LISTEN_ADDR", &raw))?,
            None => DEFAULT_LISTEN_ADDR,
        };

        let upstream_base_url = lookup("PROXY_UPSTREAM_BASE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| COINGECKO_API_URL.to_string());

        let request_timeout = match lookup("PROXY_REQUEST_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_positive("PROXY_REQUEST_TIMEOUT_MS", &raw)?),
            None => Duration::from_secs(REQUEST_TIMEOUT_SECS),
        };

        let cache_ttl = match lookup("PROXY_CACHE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("PROXY_CACHE_TTL_SECS", &raw)?),
            None => Duration::from_secs(CACHE_TTL_SECS),
        };

        let log_format = match lookup("PROXY_LOG_FORMAT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::invalid("PROXY_LOG_FORMAT", &raw))?,
            None => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            upstream_base_url,
            request_timeout,
            cache_ttl,
            log_format,
        })
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::invalid(name, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.listen_addr, Config::default().listen_addr);
        assert_eq!(config.upstream_base_url, COINGECKO_API_URL);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PROXY_LISTEN_ADDR", "127.0.0.1:3000"),
            ("PROXY_UPSTREAM_BASE_URL", " http://localhost:9999/api/v3 "),
            ("PROXY_REQUEST_TIMEOUT_MS", "2500"),
            ("PROXY_CACHE_TTL_SECS", "60"),
            ("PROXY_LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.upstream_base_url, "http://localhost:9999/api/v3");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(load(&[("PROXY_LISTEN_ADDR", "nowhere")]).is_err());
        assert!(load(&[("PROXY_CACHE_TTL_SECS", "0")]).is_err());
        assert!(load(&[("PROXY_REQUEST_TIMEOUT_MS", "fast")]).is_err());

        let err = load(&[("PROXY_LOG_FORMAT", "xml")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for PROXY_LOG_FORMAT: xml");
    }
}
