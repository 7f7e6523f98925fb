//! API Routes

pub mod analytics;
pub mod forms;
pub mod health;
pub mod schemas;

use axum::extract::OriginalUri;
use axum::http::Method;

use crate::error::ApiError;

/// Catch-all for unmatched paths
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::RouteNotFound(format!("Cannot {method} {uri}"))
}
