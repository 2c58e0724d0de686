//! Health reporting for the cached proxies
//!
//! Built purely from cache contents and recorded fetch metrics; a health
//! check never calls upstream.

use crate::{
    proxy::CachedProxy,
    types::{ComponentHealth, HealthStatus},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Health of every cached proxy
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Worst status across components
    pub status: HealthStatus,
    pub components: Vec<ComponentHealth>,
}

impl HealthReport {
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let status = components
            .iter()
            .map(|c| c.status)
            .max_by_key(|status| match status {
                HealthStatus::Healthy => 0,
                HealthStatus::Degraded => 1,
                HealthStatus::Unhealthy => 2,
            })
            .unwrap_or(HealthStatus::Healthy);

        Self { status, components }
    }
}

/// Perform a health check on one cached proxy
pub async fn check_proxy(proxy: &CachedProxy, now: DateTime<Utc>) -> ComponentHealth {
    let cache = proxy.cache();
    let entries = cache.len().await;
    let fresh = cache.fresh_count(now).await;
    let metrics = proxy.metrics().get_metrics().await;

    let status = match (fresh, entries, metrics.last_fetch_succeeded) {
        (0, 0, Some(false)) => HealthStatus::Unhealthy,
        (0, _, Some(false)) => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    };

    let message = match status {
        HealthStatus::Healthy => format!("{} proxy is operational", proxy.name()),
        HealthStatus::Degraded => format!(
            "{} proxy is serving {} stale entries",
            proxy.name(),
            entries
        ),
        HealthStatus::Unhealthy => format!(
            "{} proxy has no cached data and upstream is failing",
            proxy.name()
        ),
    };

    let mut details = HashMap::new();
    details.insert("cached_entries".to_string(), serde_json::json!(entries));
    details.insert("fresh_entries".to_string(), serde_json::json!(fresh));
    details.insert(
        "ttl_secs".to_string(),
        serde_json::json!(cache.ttl().as_secs()),
    );
    details.insert("metrics".to_string(), serde_json::json!(metrics));

    ComponentHealth {
        name: proxy.name().to_string(),
        status,
        message: Some(message),
        details,
        last_checked: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        providers::CoinGeckoUrls,
        proxy::MarketsProxy,
        store::ResponseCache,
        upstream::mock::{MockUpstream, RecordingSleeper},
    };
    use axum::body::Bytes;
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;
    use std::time::Duration;

    fn markets(upstream: &Arc<MockUpstream>, cache: &Arc<ResponseCache>) -> MarketsProxy {
        MarketsProxy::new(
            upstream.clone(),
            Arc::new(RecordingSleeper::default()),
            cache.clone(),
            CoinGeckoUrls::new("https://example.test"),
        )
    }

    #[tokio::test]
    async fn test_idle_proxy_is_healthy() {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(300)));
        let proxy = markets(&upstream, &cache);

        let health = check_proxy(proxy.inner(), Utc::now()).await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.details["cached_entries"], serde_json::json!(0));
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_without_data_is_unhealthy() {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(300)));
        let proxy = markets(&upstream, &cache);
        proxy.handle().await.unwrap();

        let report =
            HealthReport::from_components(vec![check_proxy(proxy.inner(), Utc::now()).await]);
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_failing_with_stale_data_is_degraded() {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(300)));
        cache
            .store(
                "markets",
                Bytes::from_static(b"[]"),
                Utc::now() - ChronoDuration::minutes(10),
            )
            .await;
        let proxy = markets(&upstream, &cache);
        proxy.handle().await.unwrap();

        let health = check_proxy(proxy.inner(), Utc::now()).await;
        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_terminal_status_keeps_proxy_healthy() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.push_status(404, "{\"error\":\"coin not found\"}");
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(300)));
        let proxy = markets(&upstream, &cache);
        proxy.handle().await.unwrap();

        let health = check_proxy(proxy.inner(), Utc::now()).await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(upstream.call_count(), 1);
    }

    #[test]
    fn test_report_takes_worst_status() {
        let component = |status| ComponentHealth {
            name: "x".to_string(),
            status,
            message: None,
            details: HashMap::new(),
            last_checked: Utc::now(),
        };
        let report = HealthReport::from_components(vec![
            component(HealthStatus::Healthy),
            component(HealthStatus::Degraded),
        ]);
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(HealthReport::from_components(vec![]).status, HealthStatus::Healthy);
    }
}
