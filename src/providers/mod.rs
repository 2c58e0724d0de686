//! Upstream implementations

pub mod coingecko;

pub use coingecko::{CoinGeckoUpstream, CoinGeckoUrls};
