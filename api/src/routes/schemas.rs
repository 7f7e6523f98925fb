//! Schema endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use formdesk_forms::FormSchema;

use crate::error::{ApiResult, AppJson};
use crate::models::ApiResponse;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/schema", post(save_schema))
        .route("/schema/:name", get(get_schema))
        .route("/schemas", get(list_schemas))
}

/// Create or replace a schema
#[utoipa::path(
    post,
    path = "/api/forms/schema",
    request_body = FormSchema,
    responses(
        (status = 201, description = "Schema saved", body = FormSchema),
        (status = 400, description = "Invalid schema definition")
    ),
    tag = "schemas"
)]
pub async fn save_schema(
    State(state): State<Arc<ApiState>>,
    AppJson(schema): AppJson<FormSchema>,
) -> ApiResult<(StatusCode, Json<ApiResponse<FormSchema>>)> {
    let saved = state.service.save_schema(schema).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(saved, "Form schema saved successfully"))))
}

/// Get a schema by name
#[utoipa::path(
    get,
    path = "/api/forms/schema/{name}",
    params(("name" = String, Path, description = "Schema name")),
    responses(
        (status = 200, description = "Schema", body = FormSchema),
        (status = 404, description = "Schema not found")
    ),
    tag = "schemas"
)]
pub async fn get_schema(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<ApiResponse<FormSchema>>> {
    let schema = state.service.get_schema(&name).await?;
    Ok(Json(ApiResponse::success(schema, "Schema retrieved successfully")))
}

/// List schemas, newest first
#[utoipa::path(
    get,
    path = "/api/forms/schemas",
    responses(
        (status = 200, description = "All schemas", body = [FormSchema])
    ),
    tag = "schemas"
)]
pub async fn list_schemas(State(state): State<Arc<ApiState>>) -> ApiResult<Json<ApiResponse<Vec<FormSchema>>>> {
    let schemas = state.service.list_schemas().await?;
    Ok(Json(ApiResponse::success(schemas, "Schemas retrieved successfully")))
}
