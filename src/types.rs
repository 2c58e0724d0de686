//! Types shared by the upstream client, the retry fetcher and the proxies

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// One raw upstream HTTP response, body already drained
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw `Retry-After` header value, if present
    pub retry_after: Option<String>,
    /// Response body bytes, exactly as received
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Status observed for a failed upstream attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamStatus {
    /// Upstream answered with this HTTP status
    Http(u16),
    /// No HTTP status exists: DNS, reset, timeout
    Transport,
}

impl UpstreamStatus {
    /// Marker used in headers and JSON when there is no HTTP status
    pub const TRANSPORT_MARKER: &'static str = "network-error";
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamStatus::Http(code) => write!(f, "{}", code),
            UpstreamStatus::Transport => f.write_str(Self::TRANSPORT_MARKER),
        }
    }
}

impl Serialize for UpstreamStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UpstreamStatus::Http(code) => serializer.serialize_u16(*code),
            UpstreamStatus::Transport => serializer.serialize_str(Self::TRANSPORT_MARKER),
        }
    }
}

/// Successful result of a logical upstream fetch
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: u16,
    pub body: Bytes,
}

/// Failed result of a logical upstream fetch
#[derive(Debug, Clone, Error)]
#[error("upstream failed with status {status}")]
pub struct FetchFailure {
    /// Last observed status or transport marker
    pub status: UpstreamStatus,
    /// Last parsed `Retry-After` hint
    pub retry_after: Option<Duration>,
    /// Last error body received, if any
    pub body: Option<Bytes>,
}

impl FetchFailure {
    pub fn transport() -> Self {
        Self {
            status: UpstreamStatus::Transport,
            retry_after: None,
            body: None,
        }
    }
}

/// Outcome of one logical "get the freshest upstream data" operation
pub type FetchOutcome = Result<FetchedBody, FetchFailure>;

/// Cache-status marker reported on every cached-proxy response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    /// Served from a fresh cache entry without touching upstream
    Hit,
    /// Fetched from upstream and cached
    Miss,
    /// Upstream failed, served an older cache entry
    Stale,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
        }
    }
}

/// Overall health of a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// Fresh data available or upstream currently answering
    Healthy,
    /// Only stale data available
    Degraded,
    /// No data and upstream failing
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_serialization() {
        assert_eq!(
            serde_json::to_value(UpstreamStatus::Http(503)).unwrap(),
            serde_json::json!(503)
        );
        assert_eq!(
            serde_json::to_value(UpstreamStatus::Transport).unwrap(),
            serde_json::json!("network-error")
        );
        assert_eq!(UpstreamStatus::Http(429).to_string(), "429");
    }

    #[test]
    fn test_success_range() {
        assert!(UpstreamResponse::new(200, "[]").is_success());
        assert!(UpstreamResponse::new(204, "").is_success());
        assert!(!UpstreamResponse::new(304, "").is_success());
        assert!(!UpstreamResponse::new(429, "").is_success());
    }
}
