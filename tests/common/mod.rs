#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{Request, Response},
    Router,
};
use coin_proxy::{
    config::Config,
    server::{app_router, AppState},
    TokioSleeper, Upstream, UpstreamError, UpstreamResponse,
};
use reqwest::Url;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Upstream that replays scripted statuses and counts calls
#[derive(Default)]
pub struct ScriptedUpstream {
    replies: Mutex<VecDeque<UpstreamResponse>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedUpstream {
    pub fn with_replies(replies: Vec<(u16, &'static str)>) -> Arc<Self> {
        Self::with_responses(
            replies
                .into_iter()
                .map(|(status, body)| UpstreamResponse::new(status, body))
                .collect(),
        )
    }

    pub fn with_responses(responses: Vec<UpstreamResponse>) -> Arc<Self> {
        let upstream = Self::default();
        upstream.replies.lock().unwrap().extend(responses);
        Arc::new(upstream)
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| UpstreamError::Unreachable("no scripted reply".to_string()))
    }

    fn upstream_name(&self) -> &'static str {
        "scripted"
    }
}

pub fn test_state(upstream: Arc<ScriptedUpstream>) -> Arc<AppState> {
    let config = Config {
        upstream_base_url: "https://upstream.test/api/v3".to_string(),
        ..Config::default()
    };
    Arc::new(AppState::new(upstream, Arc::new(TokioSleeper), &config))
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn router(state: Arc<AppState>) -> Router {
    app_router(state)
}
