//! CoinGecko upstream implementation

use crate::{
    constants::{
        COINGECKO_API_URL, COINGECKO_COIN_ENDPOINT_PREFIX, COINGECKO_COIN_ENDPOINT_QUERY,
        COINGECKO_MARKETS_ENDPOINT, COINGECKO_TRENDING_ENDPOINT, REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::{ProxyError, UpstreamError},
    types::UpstreamResponse,
    upstream::Upstream,
};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use std::time::Duration;

/// Builds CoinGecko URLs against a configurable base
#[derive(Debug, Clone)]
pub struct CoinGeckoUrls {
    base_url: String,
}

impl Default for CoinGeckoUrls {
    fn default() -> Self {
        Self::new(COINGECKO_API_URL)
    }
}

impl CoinGeckoUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn parse(&self, path: &str) -> Result<Url, ProxyError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw)
            .map_err(|e| ProxyError::internal(format!("Invalid upstream URL {}: {}", raw, e)))
    }

    /// Top coins by market cap
    pub fn markets(&self) -> Result<Url, ProxyError> {
        self.parse(COINGECKO_MARKETS_ENDPOINT)
    }

    /// Detail for one coin; `coin_id` is percent-encoded into the path
    pub fn coin(&self, coin_id: &str) -> Result<Url, ProxyError> {
        self.parse(&format!(
            "{}{}{}",
            COINGECKO_COIN_ENDPOINT_PREFIX,
            urlencoding::encode(coin_id),
            COINGECKO_COIN_ENDPOINT_QUERY
        ))
    }

    /// Trending coins
    pub fn trending(&self) -> Result<Url, ProxyError> {
        self.parse(COINGECKO_TRENDING_ENDPOINT)
    }
}

/// CoinGecko HTTP client
pub struct CoinGeckoUpstream {
    client: Client,
}

impl CoinGeckoUpstream {
    /// Creates a new CoinGecko client with the default request timeout
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a new CoinGecko client with a per-attempt timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(UpstreamError::NetworkError)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for CoinGeckoUpstream {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError> {
        tracing::debug!(%url, "Requesting CoinGecko");

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(UpstreamError::NetworkError)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // The body stream can only be consumed once
        let body = response.bytes().await.map_err(UpstreamError::NetworkError)?;

        Ok(UpstreamResponse {
            status,
            retry_after,
            body,
        })
    }

    fn upstream_name(&self) -> &'static str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markets_url() {
        let url = CoinGeckoUrls::default().markets().unwrap();
        assert_eq!(url.path(), "/api/v3/coins/markets");
        assert!(url.query().unwrap().contains("per_page=150"));
        assert!(url.query().unwrap().contains("sparkline=true"));
    }

    #[test]
    fn test_coin_url_encodes_id() {
        let urls = CoinGeckoUrls::new("https://example.test/api/v3/");
        let url = urls.coin("wrapped bitcoin/x").unwrap();
        assert_eq!(url.path(), "/api/v3/coins/wrapped%20bitcoin%2Fx");
        assert_eq!(url.query(), Some("localization=false&sparkline=true"));
    }

    #[test]
    fn test_trending_url() {
        let url = CoinGeckoUrls::new("http://127.0.0.1:9000").trending().unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/search/trending");
    }

    #[test]
    fn test_invalid_base_url_is_internal_error() {
        let err = CoinGeckoUrls::new("not a url").markets().unwrap_err();
        assert!(matches!(err, ProxyError::Internal(_)));
    }
}
