// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorBody;

/// Errors returned by the relay's HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("upstream model service failed: {0}")]
    Upstream(String),
    #[error("MODEL_API_URL is not configured")]
    NotConfigured,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        };
        tracing::warn!(%status, error = %self, "request failed");
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Failures seen by the chat client when talking to the router agent.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the router agent: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("the router agent did not answer within {0} seconds")]
    Timeout(u64),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("malformed response from the router agent: {0}")]
    Decode(String),
    #[error("{0}")]
    Logical(String),
}

impl ClientError {
    /// Logical errors carry server-supplied text; everything else is a
    /// connection problem from the user's point of view.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ClientError::Logical(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
