//! Proxy endpoints in front of CoinGecko
//!
//! ```text
//! request
//!     ↓
//! fresh cache entry? ──yes──> 200 HIT
//!     ↓ no
//! RetryingFetcher
//!     ├─ ok ─────────────────> store, 200 MISS
//!     ├─ failed, any entry ──> 200 STALE
//!     └─ failed, no entry ───> 502
//! ```
//!
//! Markets and coin detail share [`CachedProxy`]; trending is a single
//! uncached, unretried call.

pub mod coin;
pub mod markets;
pub mod trending;

pub use coin::CoinProxy;
pub use markets::MarketsProxy;
pub use trending::TrendingProxy;

use crate::{
    constants::{
        CACHE_CONTROL_FRESH, CACHE_CONTROL_NO_STORE, CACHE_CONTROL_STALE, HEADER_CACHE_STATUS,
        HEADER_RETRY_AFTER, HEADER_UPSTREAM_STATUS,
    },
    metrics::MetricsCollector,
    retry::{classify_status, AttemptClass, RetryingFetcher},
    store::ResponseCache,
    types::{CacheStatus, FetchFailure, FetchOutcome, UpstreamStatus},
};
use axum::{
    body::Bytes,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A fully decided proxy response
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub cache_status: Option<CacheStatus>,
    pub cache_control: Option<&'static str>,
    pub upstream_status: Option<UpstreamStatus>,
    pub retry_after: Option<Duration>,
}

impl ProxyResponse {
    fn json(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            cache_status: None,
            cache_control: None,
            upstream_status: None,
            retry_after: None,
        }
    }

    /// 200 with a cached or freshly fetched body
    pub fn fresh(body: Bytes, cache_status: CacheStatus) -> Self {
        Self {
            cache_status: Some(cache_status),
            cache_control: Some(CACHE_CONTROL_FRESH),
            ..Self::json(StatusCode::OK, body)
        }
    }

    /// 200 with an old body because the refresh failed
    pub fn stale(body: Bytes, failure: &FetchFailure) -> Self {
        Self {
            cache_status: Some(CacheStatus::Stale),
            cache_control: Some(CACHE_CONTROL_STALE),
            upstream_status: Some(failure.status),
            retry_after: failure.retry_after,
            ..Self::json(StatusCode::OK, body)
        }
    }

    /// 502 when the refresh failed and nothing is cached
    pub fn unavailable(failure: &FetchFailure) -> Self {
        let body = serde_json::json!({
            "error": "CoinGecko unavailable",
            "upstreamStatus": failure.status,
        });
        Self {
            cache_control: Some(CACHE_CONTROL_NO_STORE),
            upstream_status: Some(failure.status),
            retry_after: failure.retry_after,
            ..Self::json(StatusCode::BAD_GATEWAY, body.to_string())
        }
    }

    /// Successful pass-through body
    pub fn pass_through(body: Bytes) -> Self {
        Self {
            cache_control: Some(CACHE_CONTROL_FRESH),
            ..Self::json(StatusCode::OK, body)
        }
    }

    /// Upstream error relayed with the upstream's own status
    pub fn relayed(status: StatusCode) -> Self {
        let body = serde_json::json!({
            "error": "Upstream error",
            "status": status.as_u16(),
        });
        Self {
            upstream_status: Some(UpstreamStatus::Http(status.as_u16())),
            ..Self::json(status, body.to_string())
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        if let Some(cache_control) = self.cache_control {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
        }
        if let Some(cache_status) = self.cache_status {
            headers.insert(
                HeaderName::from_static(HEADER_CACHE_STATUS),
                HeaderValue::from_static(cache_status.as_str()),
            );
        }
        if let Some(upstream_status) = self.upstream_status {
            let value = match upstream_status {
                UpstreamStatus::Http(code) => HeaderValue::from(code),
                UpstreamStatus::Transport => {
                    HeaderValue::from_static(UpstreamStatus::TRANSPORT_MARKER)
                }
            };
            headers.insert(HeaderName::from_static(HEADER_UPSTREAM_STATUS), value);
        }
        if let Some(retry_after) = self.retry_after {
            let secs = u64::try_from(retry_after.as_millis().div_ceil(1000)).unwrap_or(u64::MAX);
            headers.insert(
                HeaderName::from_static(HEADER_RETRY_AFTER),
                HeaderValue::from(secs),
            );
        }

        response
    }
}

/// Cache-first proxy with retrying refresh and stale fallback
pub struct CachedProxy {
    name: &'static str,
    fetcher: RetryingFetcher,
    cache: Arc<ResponseCache>,
    metrics: MetricsCollector,
}

impl CachedProxy {
    pub fn new(name: &'static str, fetcher: RetryingFetcher, cache: Arc<ResponseCache>) -> Self {
        Self {
            name,
            fetcher,
            cache,
            metrics: MetricsCollector::new(name),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Serves `key`, refreshing from `url` when the entry is missing or stale
    pub async fn serve(&self, key: &str, url: &Url) -> ProxyResponse {
        if let Some(entry) = self.cache.get_fresh(key, Utc::now()).await {
            tracing::debug!(proxy = self.name, key, "Cache hit");
            return ProxyResponse::fresh(entry.body, CacheStatus::Hit);
        }

        let started = Instant::now();
        let outcome = self.fetcher.fetch(url).await;
        self.metrics
            .record_fetch(started.elapsed(), upstream_responded(&outcome))
            .await;

        match outcome {
            Ok(fetched) => {
                self.cache.store(key, fetched.body.clone(), Utc::now()).await;
                tracing::debug!(
                    proxy = self.name,
                    key,
                    status = fetched.status,
                    "Cache miss, refreshed"
                );
                ProxyResponse::fresh(fetched.body, CacheStatus::Miss)
            }
            Err(failure) => match self.cache.get(key).await {
                Some(entry) => {
                    tracing::warn!(
                        proxy = self.name,
                        key,
                        upstream_status = %failure.status,
                        age_secs = entry.age(Utc::now()).as_secs(),
                        "Upstream failed, serving stale entry"
                    );
                    ProxyResponse::stale(entry.body, &failure)
                }
                None => {
                    tracing::warn!(
                        proxy = self.name,
                        key,
                        upstream_status = %failure.status,
                        "Upstream failed with nothing cached"
                    );
                    ProxyResponse::unavailable(&failure)
                }
            },
        }
    }
}

/// Whether upstream behaved normally, so a terminal status like a 404 for an
/// unknown coin id does not count against its health
fn upstream_responded(outcome: &FetchOutcome) -> bool {
    match outcome {
        Ok(_) => true,
        Err(failure) => match failure.status {
            UpstreamStatus::Http(code) => classify_status(code) == AttemptClass::Terminal,
            UpstreamStatus::Transport => false,
        },
    }
}
