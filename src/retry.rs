//! Retry-with-backoff fetching against a fixed delay schedule
//!
//! Each logical fetch walks a schedule such as `[0, 700ms, 1500ms, 2500ms]`,
//! one slot per attempt. 2xx ends the walk with the body, 429/5xx and
//! transport failures move on to the next slot, any other status ends it
//! immediately. A `Retry-After` hint from the previous attempt, capped at
//! [`MAX_RETRY_AFTER_MS`], is slept on top of the scheduled delay.

use crate::{
    constants::MAX_RETRY_AFTER_MS,
    types::{FetchFailure, FetchOutcome, FetchedBody, UpstreamResponse, UpstreamStatus},
    upstream::Upstream,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

/// Fixed, non-decreasing delay schedule; one slot per attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
}

impl RetrySchedule {
    /// Builds a schedule from millisecond delays
    ///
    /// An empty slice still yields a single immediate attempt.
    pub fn from_millis(delays_ms: &[u64]) -> Self {
        let mut delays: Vec<Duration> = delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect();
        if delays.is_empty() {
            delays.push(Duration::ZERO);
        }
        Self { delays }
    }

    /// Total number of attempts
    pub fn attempts(&self) -> usize {
        self.delays.len()
    }

    /// Scheduled delay before `attempt` (0-indexed)
    pub fn scheduled_delay(&self, attempt: usize) -> Duration {
        self.delays.get(attempt).copied().unwrap_or(Duration::ZERO)
    }

    /// Worst-case time spent sleeping on the schedule alone
    pub fn total_delay(&self) -> Duration {
        self.delays.iter().sum()
    }
}

/// Largest hint `parse_retry_after` reports, whole seconds only
pub const MAX_HINT: Duration = Duration::from_secs(u64::MAX);

/// How a single upstream status is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptClass {
    Success,
    Transient,
    Terminal,
}

/// Classifies an HTTP status
pub fn classify_status(status: u16) -> AttemptClass {
    match status {
        200..=299 => AttemptClass::Success,
        429 | 500..=599 => AttemptClass::Transient,
        _ => AttemptClass::Terminal,
    }
}

/// Parses a `Retry-After` value into a delay
///
/// Accepts delta-seconds (`"2"`) or an HTTP-date. A date in the past yields
/// zero. Values too large for a `Duration` saturate at [`MAX_HINT`].
/// Anything else yields `None`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    if let Ok(secs) = value.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            return Some(Duration::try_from_secs_f64(secs).unwrap_or(MAX_HINT));
        }
        return None;
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some(
        at.signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO),
    )
}

/// Delay to sleep before `attempt` given the failure of the previous one
///
/// The scheduled delay plus the previous failure's hint, capped at
/// [`MAX_RETRY_AFTER_MS`]. The first attempt never waits on a hint.
pub fn delay_before_attempt(
    schedule: &RetrySchedule,
    attempt: usize,
    previous: Option<&FetchFailure>,
) -> Duration {
    let hint = previous
        .and_then(|failure| failure.retry_after)
        .map(|hint| hint.min(Duration::from_millis(MAX_RETRY_AFTER_MS)))
        .unwrap_or(Duration::ZERO);

    schedule.scheduled_delay(attempt) + hint
}

/// Suspends the current task; swapped out in tests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fetches one URL, retrying transient failures along a [`RetrySchedule`]
///
/// Holds no state between invocations.
pub struct RetryingFetcher {
    upstream: Arc<dyn Upstream>,
    sleeper: Arc<dyn Sleeper>,
    schedule: RetrySchedule,
}

impl RetryingFetcher {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        sleeper: Arc<dyn Sleeper>,
        schedule: RetrySchedule,
    ) -> Self {
        Self {
            upstream,
            sleeper,
            schedule,
        }
    }

    pub fn schedule(&self) -> &RetrySchedule {
        &self.schedule
    }

    /// Runs the schedule against `url`
    ///
    /// # Returns
    /// The first 2xx body, or the last failure once a terminal status is seen
    /// or the schedule is exhausted
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        let attempts = self.schedule.attempts();
        let mut last_failure: Option<FetchFailure> = None;
        let mut last_hint: Option<Duration> = None;

        for attempt in 0..attempts {
            let delay = delay_before_attempt(&self.schedule, attempt, last_failure.as_ref());
            if !delay.is_zero() {
                self.sleeper.sleep(delay).await;
            }

            let failure = match self.upstream.get(url).await {
                Ok(response) => match classify_status(response.status) {
                    AttemptClass::Success => {
                        tracing::debug!(
                            attempt = attempt + 1,
                            status = response.status,
                            upstream = self.upstream.upstream_name(),
                            "Upstream fetch succeeded"
                        );
                        return Ok(FetchedBody {
                            status: response.status,
                            body: response.body,
                        });
                    }
                    AttemptClass::Transient => failure_from_response(response),
                    AttemptClass::Terminal => {
                        let failure = failure_from_response(response);
                        tracing::warn!(
                            attempt = attempt + 1,
                            status = %failure.status,
                            upstream = self.upstream.upstream_name(),
                            "Upstream returned a terminal status, not retrying"
                        );
                        return Err(failure);
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        upstream = self.upstream.upstream_name(),
                        "Upstream request failed"
                    );
                    FetchFailure::transport()
                }
            };

            tracing::warn!(
                attempt = attempt + 1,
                max_attempts = attempts,
                status = %failure.status,
                retry_after_ms = failure.retry_after.map(|d| d.as_millis() as u64),
                "Transient upstream failure"
            );

            if failure.retry_after.is_some() {
                last_hint = failure.retry_after;
            }
            last_failure = Some(failure);
        }

        let mut failure = last_failure.unwrap_or_else(FetchFailure::transport);
        if failure.retry_after.is_none() {
            failure.retry_after = last_hint;
        }
        Err(failure)
    }
}

fn failure_from_response(response: UpstreamResponse) -> FetchFailure {
    let retry_after = response
        .retry_after
        .as_deref()
        .and_then(|value| parse_retry_after(value, Utc::now()));

    FetchFailure {
        status: UpstreamStatus::Http(response.status),
        retry_after,
        body: (!response.body.is_empty()).then_some(response.body),
    }
}
