//! Upstream abstraction for issuing one HTTP GET against the market-data API

use crate::{error::UpstreamError, types::UpstreamResponse};
use async_trait::async_trait;
use reqwest::Url;

/// Trait for upstream market-data clients
///
/// One call is exactly one HTTP attempt: implementations never retry and
/// must drain the response body once before returning.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Performs a GET against a fully constructed URL
    ///
    /// # Returns
    /// The status, `Retry-After` header and body of the response, or an
    /// error if no HTTP response was received
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError>;

    /// Returns the name of this upstream
    fn upstream_name(&self) -> &'static str;
}
