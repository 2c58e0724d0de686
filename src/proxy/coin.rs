//! Single coin detail, one cache entry per coin id

use super::{CachedProxy, ProxyResponse};
use crate::{
    constants::COIN_RETRY_SCHEDULE_MS,
    error::ProxyError,
    providers::CoinGeckoUrls,
    retry::{RetrySchedule, RetryingFetcher, Sleeper},
    store::ResponseCache,
    upstream::Upstream,
};
use std::sync::Arc;

/// Trims and lower-cases a requested coin id; `None` when nothing is left
pub fn normalize_coin_id(raw: Option<&str>) -> Option<String> {
    let id = raw?.trim().to_lowercase();
    (!id.is_empty()).then_some(id)
}

pub struct CoinProxy {
    proxy: CachedProxy,
    urls: CoinGeckoUrls,
}

impl CoinProxy {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        sleeper: Arc<dyn Sleeper>,
        cache: Arc<ResponseCache>,
        urls: CoinGeckoUrls,
    ) -> Self {
        let fetcher = RetryingFetcher::new(
            upstream,
            sleeper,
            RetrySchedule::from_millis(COIN_RETRY_SCHEDULE_MS),
        );
        Self {
            proxy: CachedProxy::new("coin", fetcher, cache),
            urls,
        }
    }

    pub fn inner(&self) -> &CachedProxy {
        &self.proxy
    }

    /// Serves the detail payload for the coin named by the `id` query parameter
    pub async fn handle(&self, id: Option<&str>) -> Result<ProxyResponse, ProxyError> {
        let coin_id = normalize_coin_id(id).ok_or(ProxyError::MissingCoinId)?;
        let url = self.urls.coin(&coin_id)?;
        Ok(self.proxy.serve(&coin_id, &url).await)
    }
}
