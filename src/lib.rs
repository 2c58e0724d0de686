//! # CoinGecko proxy
//!
//! Small HTTP endpoints that keep a browser client away from the rate-limited
//! CoinGecko API. Markets and coin detail responses are cached in process
//! memory for five minutes, refreshed with retry and backoff, and served
//! stale when upstream is down. Trending is relayed as-is.
//!
//! ## Endpoints
//!
//! - `GET /api/markets` — top coins by market cap
//! - `GET /api/coin?id=<coin-id>` — one coin's detail payload
//! - `GET /api/trending` — trending coins, uncached
//! - `GET /healthz` — cache and upstream health of the cached proxies
//!
//! ## Usage
//!
//! ```no_run
//! use coin_proxy::{config::Config, server::{app_router, build_state}};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let router = app_router(build_state(&config)?);
//! let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! axum router
//!     ↓
//! MarketsProxy / CoinProxy ──> ResponseCache (in-memory, per proxy)
//!     ↓ miss or stale
//! RetryingFetcher (fixed schedule + capped Retry-After)
//!     ↓
//! Upstream (CoinGecko over reqwest)
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod health;
pub mod metrics;
pub mod providers;
pub mod proxy;
pub mod retry;
pub mod server;
pub mod store;
pub mod types;
pub mod upstream;

// Re-export commonly used types
pub use error::{ConfigError, ProxyError, UpstreamError};
pub use metrics::UpstreamMetrics;
pub use proxy::{CachedProxy, CoinProxy, MarketsProxy, ProxyResponse, TrendingProxy};
pub use retry::{RetrySchedule, RetryingFetcher, Sleeper, TokioSleeper};
pub use store::{CacheEntry, ResponseCache};
pub use types::{CacheStatus, FetchFailure, FetchOutcome, UpstreamResponse, UpstreamStatus};
pub use upstream::Upstream;
