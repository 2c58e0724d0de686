//! HTTP surface: shared state, router and tracing setup

use crate::{
    config::{Config, LogFormat},
    error::{ProxyError, UpstreamError},
    health::{check_proxy, HealthReport},
    providers::{CoinGeckoUpstream, CoinGeckoUrls},
    proxy::{CoinProxy, MarketsProxy, ProxyResponse, TrendingProxy},
    retry::{Sleeper, TokioSleeper},
    store::ResponseCache,
    upstream::Upstream,
};
use axum::{
    extract::{Query, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Per-process state: one cache per cached proxy, created once and never torn down
pub struct AppState {
    pub markets: MarketsProxy,
    pub coin: CoinProxy,
    pub trending: TrendingProxy,
}

impl AppState {
    pub fn new(upstream: Arc<dyn Upstream>, sleeper: Arc<dyn Sleeper>, config: &Config) -> Self {
        let urls = CoinGeckoUrls::new(config.upstream_base_url.clone());

        Self {
            markets: MarketsProxy::new(
                upstream.clone(),
                sleeper.clone(),
                Arc::new(ResponseCache::new(config.cache_ttl)),
                urls.clone(),
            ),
            coin: CoinProxy::new(
                upstream.clone(),
                sleeper,
                Arc::new(ResponseCache::new(config.cache_ttl)),
                urls.clone(),
            ),
            trending: TrendingProxy::new(upstream, urls),
        }
    }
}

/// Builds production state backed by the CoinGecko client and tokio timers
pub fn build_state(config: &Config) -> Result<Arc<AppState>, UpstreamError> {
    let upstream = CoinGeckoUpstream::with_timeout(config.request_timeout)?;
    tracing::info!(
        upstream = upstream.upstream_name(),
        base_url = %config.upstream_base_url,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Proxy state initialized"
    );
    Ok(Arc::new(AppState::new(
        Arc::new(upstream),
        Arc::new(TokioSleeper),
        config,
    )))
}

pub fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

async fn markets(State(state): State<Arc<AppState>>) -> Result<ProxyResponse, ProxyError> {
    state.markets.handle().await
}

/// First `id` in the query string; later duplicates are ignored
fn first_coin_id(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(name, _)| name == "id")
        .map(|(_, value)| value.as_str())
}

async fn coin(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ProxyResponse, ProxyError> {
    state.coin.handle(first_coin_id(&params)).await
}

async fn trending(State(state): State<Arc<AppState>>) -> Result<ProxyResponse, ProxyError> {
    state.trending.handle().await
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let now = Utc::now();
    let components = vec![
        check_proxy(state.markets.inner(), now).await,
        check_proxy(state.coin.inner(), now).await,
    ];
    Json(HealthReport::from_components(components))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    ProxyError::internal(details).into_response()
}

pub fn app_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/api/markets", get(markets))
        .route("/api/coin", get(coin))
        .route("/api/trending", get(trending))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
