//! Error types for the CoinGecko proxy

use crate::constants::CACHE_CONTROL_NO_STORE;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by a single upstream attempt before any HTTP status exists
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network request failed (DNS, connection reset, timeout, body read)
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Upstream could not be reached for a reason other than a reqwest failure
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),
}

/// Errors surfaced by a proxy handler as a non-upstream response
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The coin endpoint was called without a usable `id`
    #[error("Missing coin id")]
    MissingCoinId,

    /// Anything unexpected while handling the request
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Creates an Internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingCoinId => StatusCode::BAD_REQUEST,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ProxyError::MissingCoinId => ErrorBody {
                error: "Missing coin id".to_string(),
                details: None,
            },
            ProxyError::Internal(details) => {
                tracing::error!(error = %details, "Proxy handler failed");
                ErrorBody {
                    error: "Internal proxy error".to_string(),
                    details: Some(details),
                }
            }
        };

        (
            status,
            [
                (header::CACHE_CONTROL, CACHE_CONTROL_NO_STORE),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            ],
            Json(body),
        )
            .into_response()
    }
}

/// Errors that can occur while loading runtime configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            name,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_coin_id_is_bad_request() {
        let response = ProxyError::MissingCoinId.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            CACHE_CONTROL_NO_STORE
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Missing coin id");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_carries_details() {
        let response = ProxyError::internal("bad base url").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal proxy error");
        assert_eq!(json["details"], "bad base url");
    }
}
