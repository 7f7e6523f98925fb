//! Analytics endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use formdesk_forms::AnalyticsSnapshot;

use crate::error::ApiResult;
use crate::models::ApiResponse;
use crate::ApiState;

/// Recompute the analytics snapshot over every stored submission
#[utoipa::path(
    get,
    path = "/api/analytics",
    responses(
        (status = 200, description = "Analytics snapshot", body = AnalyticsSnapshot)
    ),
    tag = "analytics"
)]
pub async fn get_analytics(State(state): State<Arc<ApiState>>) -> ApiResult<Json<ApiResponse<AnalyticsSnapshot>>> {
    let snapshot = state.service.analytics().await?;
    Ok(Json(ApiResponse::success(snapshot, "Analytics data retrieved successfully")))
}
