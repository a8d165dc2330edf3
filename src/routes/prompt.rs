use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use crate::{
    error::AppError,
    message::{ClassificationResponse, HealthStatus, PromptRequest},
    services::metrics_manager::MetricsData,
    state::SharedState,
};

/// Forwards the ticket to the model service and hands its answer back
/// unchanged, status code included.
pub async fn prompt_handler(
    State(state): State<SharedState>,
    Json(payload): Json<PromptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let prompt = payload.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("Prompt cannot be empty".to_string()));
    }

    let url = state.model_api_url.as_deref().ok_or(AppError::NotConfigured)?;

    let upstream = state
        .http_client
        .post(url)
        .json(&PromptRequest { prompt: prompt.to_string() })
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "model service unreachable");
            AppError::Upstream(e.to_string())
        })?;

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body: Value = upstream
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("invalid JSON from model service: {e}")))?;

    match serde_json::from_value::<ClassificationResponse>(body.clone()) {
        Ok(parsed) if status.is_success() => state.metrics.record_classification(&parsed).await,
        _ => state.metrics.record_failure().await,
    }
    tracing::info!(%status, "relayed classification");

    Ok((status, Json(body)))
}

pub async fn health_handler(State(state): State<SharedState>) -> Json<HealthStatus> {
    let Some(url) = state.model_health_url.as_deref() else {
        return Json(HealthStatus::healthy());
    };

    match state.http_client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => Json(HealthStatus::healthy()),
        Ok(resp) => {
            tracing::warn!(status = %resp.status(), "model service health check failed");
            Json(HealthStatus { status: "degraded".to_string() })
        }
        Err(e) => {
            tracing::warn!(error = %e, "model service health check unreachable");
            Json(HealthStatus { status: "degraded".to_string() })
        }
    }
}

pub async fn metrics_handler(State(state): State<SharedState>) -> Json<MetricsData> {
    Json(state.metrics.get_metrics().await)
}
