//! Upstream fetch metrics
//!
//! Tracks latency percentiles and success rates of the logical fetches a
//! cached proxy makes, retries included.

use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics snapshot for one proxy
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamMetrics {
    /// Name of the proxy
    pub proxy_name: String,
    /// 50th percentile latency of successful fetches in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency of successful fetches in milliseconds
    pub latency_p99_ms: f64,
    /// Share of fetches where upstream responded normally (0.0 to 1.0);
    /// terminal statuses such as 404 count as responded
    pub success_rate: f64,
    /// Total number of fetches tracked
    pub total_fetches: u64,
    /// Number of failed fetches
    pub failed_fetches: u64,
    /// Whether the most recent fetch succeeded, if any fetch happened
    pub last_fetch_succeeded: Option<bool>,
}

impl UpstreamMetrics {
    /// Creates metrics with no data
    pub fn empty(proxy_name: &str) -> Self {
        Self {
            proxy_name: proxy_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_fetches: 0,
            failed_fetches: 0,
            last_fetch_succeeded: None,
        }
    }
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<LatencySample>,
    total: u64,
    failed: u64,
}

/// Collects and computes metrics for one proxy
pub struct MetricsCollector {
    proxy_name: String,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    /// Creates a new metrics collector
    pub fn new(proxy_name: &str) -> Self {
        Self {
            proxy_name: proxy_name.to_string(),
            counters: RwLock::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    /// Records a fetch with its duration and success status
    pub async fn record_fetch(&self, duration: Duration, success: bool) {
        let mut counters = self.counters.write().await;
        counters.total += 1;
        if !success {
            counters.failed += 1;
        }

        if counters.samples.len() >= MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> UpstreamMetrics {
        let counters = self.counters.read().await;

        if counters.samples.is_empty() {
            return UpstreamMetrics::empty(&self.proxy_name);
        }

        let mut latencies: Vec<f64> = counters
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();

        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if counters.total > 0 {
            (counters.total - counters.failed) as f64 / counters.total as f64
        } else {
            1.0
        };

        UpstreamMetrics {
            proxy_name: self.proxy_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_fetches: counters.total,
            failed_fetches: counters.failed,
            last_fetch_succeeded: counters.samples.back().map(|s| s.success),
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("markets");

        collector.record_fetch(Duration::from_millis(100), true).await;
        collector.record_fetch(Duration::from_millis(200), true).await;
        collector.record_fetch(Duration::from_millis(2400), false).await;

        let metrics = collector.get_metrics().await;

        assert_eq!(metrics.proxy_name, "markets");
        assert_eq!(metrics.total_fetches, 3);
        assert_eq!(metrics.failed_fetches, 1);
        assert_eq!(metrics.last_fetch_succeeded, Some(false));
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
    }

    #[tokio::test]
    async fn test_empty_metrics() {
        let metrics = MetricsCollector::new("coin").get_metrics().await;
        assert_eq!(metrics.total_fetches, 0);
        assert_eq!(metrics.last_fetch_succeeded, None);
    }

    #[tokio::test]
    async fn test_sample_window_is_bounded() {
        let collector = MetricsCollector::new("coin");
        for _ in 0..(MAX_SAMPLES + 20) {
            collector.record_fetch(Duration::from_millis(5), true).await;
        }
        assert_eq!(collector.counters.read().await.samples.len(), MAX_SAMPLES);
        assert_eq!(collector.get_metrics().await.total_fetches, 120);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 9.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }
}
