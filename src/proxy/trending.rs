//! Trending coins, relayed as-is with no cache and no retry

use super::ProxyResponse;
use crate::{error::ProxyError, providers::CoinGeckoUrls, upstream::Upstream};
use axum::http::StatusCode;
use std::sync::Arc;

pub struct TrendingProxy {
    upstream: Arc<dyn Upstream>,
    urls: CoinGeckoUrls,
}

impl TrendingProxy {
    pub fn new(upstream: Arc<dyn Upstream>, urls: CoinGeckoUrls) -> Self {
        Self { upstream, urls }
    }

    /// One upstream call; non-2xx statuses are relayed, transport failures are internal
    pub async fn handle(&self) -> Result<ProxyResponse, ProxyError> {
        let url = self.urls.trending()?;
        let response = self
            .upstream
            .get(&url)
            .await
            .map_err(|e| ProxyError::internal(e.to_string()))?;

        if response.is_success() {
            return Ok(ProxyResponse::pass_through(response.body));
        }

        tracing::warn!(status = response.status, "Trending upstream returned an error");
        let status = StatusCode::from_u16(response.status)
            .map_err(|e| ProxyError::internal(format!("Invalid upstream status: {}", e)))?;
        Ok(ProxyResponse::relayed(status))
    }
}
