//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ApiState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub message: String,
    pub version: String,
    pub timestamp: String,
    pub environment: String,
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy".into(),
        message: "Server is running".into(),
        version: state.version.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.environment.clone(),
    })
}
