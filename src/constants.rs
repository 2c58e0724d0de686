//! Constants for the CoinGecko proxy
//!
//! Compile-time defaults for every proxy. A few of them (listen address,
//! upstream base URL, request timeout, TTL) can be overridden at runtime
//! through [`crate::config::Config`].

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// How long a cached upstream body is served without refreshing (in seconds)
pub const CACHE_TTL_SECS: u64 = 300;

/// Delay schedule for the markets proxy (in milliseconds, one slot per attempt)
pub const MARKETS_RETRY_SCHEDULE_MS: &[u64] = &[0, 800, 1600];

/// Delay schedule for the coin detail proxy (in milliseconds, one slot per attempt)
pub const COIN_RETRY_SCHEDULE_MS: &[u64] = &[0, 700, 1500, 2500];

/// Upper bound on an honored `Retry-After` hint (in milliseconds)
pub const MAX_RETRY_AFTER_MS: u64 = 5000;

/// HTTP request timeout for a single upstream attempt (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Top coins by market cap, one page of 150, with sparklines
pub const COINGECKO_MARKETS_ENDPOINT: &str =
    "/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=150&page=1&sparkline=true";

/// Per-coin detail endpoint; the coin id is inserted between prefix and suffix
pub const COINGECKO_COIN_ENDPOINT_PREFIX: &str = "/coins/";
pub const COINGECKO_COIN_ENDPOINT_QUERY: &str = "?localization=false&sparkline=true";

/// Trending search endpoint
pub const COINGECKO_TRENDING_ENDPOINT: &str = "/search/trending";

/// User agent for upstream requests
pub const USER_AGENT: &str = "coin-proxy/0.1.0";

/// Default socket address for the HTTP server
pub const DEFAULT_LISTEN_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));

/// Cache-Control for fresh (HIT/MISS) and pass-through success responses
pub const CACHE_CONTROL_FRESH: &str = "public, max-age=60, s-maxage=300";

/// Cache-Control for stale responses, so shared caches recheck sooner
pub const CACHE_CONTROL_STALE: &str = "public, max-age=30, s-maxage=120";

/// Cache-Control for error responses
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

/// Diagnostic header carrying HIT/MISS/STALE
pub const HEADER_CACHE_STATUS: &str = "x-cache";

/// Diagnostic header carrying the last upstream status on stale/failed responses
pub const HEADER_UPSTREAM_STATUS: &str = "x-upstream-status";

/// Diagnostic header carrying the captured retry hint, in whole seconds
pub const HEADER_RETRY_AFTER: &str = "x-retry-after";
