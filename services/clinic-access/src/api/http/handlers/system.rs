//! 健康检查与指标

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use clinic_errors::AppError;
use clinic_telemetry::HealthStatus;

use crate::api::http::state::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mut status = HealthStatus::new();
    match state.store_health.ping().await {
        Ok(()) => status.add_check(state.store_health.backend(), true, None),
        Err(e) => status.add_check(state.store_health.backend(), false, Some(e.to_string())),
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => AppError::not_found("Metrics are disabled").into_response(),
    }
}

pub async fn not_found() -> Response {
    AppError::not_found("No such route").into_response()
}
