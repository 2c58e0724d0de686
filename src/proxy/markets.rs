//! Top coins by market cap, one shared cache entry

use super::{CachedProxy, ProxyResponse};
use crate::{
    constants::MARKETS_RETRY_SCHEDULE_MS,
    error::ProxyError,
    providers::CoinGeckoUrls,
    retry::{RetrySchedule, RetryingFetcher, Sleeper},
    store::ResponseCache,
    upstream::Upstream,
};
use std::sync::Arc;

/// The markets listing takes no parameters, so it lives under one key
pub const MARKETS_CACHE_KEY: &str = "markets";

pub struct MarketsProxy {
    proxy: CachedProxy,
    urls: CoinGeckoUrls,
}

impl MarketsProxy {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        sleeper: Arc<dyn Sleeper>,
        cache: Arc<ResponseCache>,
        urls: CoinGeckoUrls,
    ) -> Self {
        let fetcher = RetryingFetcher::new(
            upstream,
            sleeper,
            RetrySchedule::from_millis(MARKETS_RETRY_SCHEDULE_MS),
        );
        Self {
            proxy: CachedProxy::new("markets", fetcher, cache),
            urls,
        }
    }

    pub fn inner(&self) -> &CachedProxy {
        &self.proxy
    }

    pub async fn handle(&self) -> Result<ProxyResponse, ProxyError> {
        let url = self.urls.markets()?;
        Ok(self.proxy.serve(MARKETS_CACHE_KEY, &url).await)
    }
}
