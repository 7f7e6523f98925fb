//! Submission endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use formdesk_forms::application::SubmissionPage;
use formdesk_forms::{FormsError, Page, PageRequest, Submission};

use crate::error::{ApiError, ApiResult, AppJson};
use crate::models::{ApiResponse, SubmitRequest, ValidateRequest};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/submit", post(submit))
        .route("/submissions", get(list_submissions))
        .route("/submissions/:id", get(get_submission))
        .route("/validate", post(validate))
}

/// Submit a form record
#[utoipa::path(
    post,
    path = "/api/forms/submit",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Submission stored", body = Submission),
        (status = 400, description = "Empty or invalid record"),
        (status = 404, description = "Named schema not found"),
        (status = 409, description = "Duplicate submission")
    ),
    tag = "forms"
)]
pub async fn submit(
    State(state): State<Arc<ApiState>>,
    AppJson(request): AppJson<SubmitRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Submission>>)> {
    let submission = state
        .service
        .submit_for_schema(&request.data, request.schema_name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(submission, "Form submitted successfully"))))
}

/// List submissions, newest first
#[utoipa::path(
    get,
    path = "/api/forms/submissions",
    params(PageRequest),
    responses(
        (status = 200, description = "One page of submissions", body = SubmissionPage)
    ),
    tag = "forms"
)]
pub async fn list_submissions(
    State(state): State<Arc<ApiState>>,
    Query(request): Query<PageRequest>,
) -> ApiResult<Json<ApiResponse<Page<Submission>>>> {
    let page = state.service.list_submissions(request).await?;
    Ok(Json(ApiResponse::success(page, "Submissions retrieved successfully")))
}

/// Get a submission by ID
#[utoipa::path(
    get,
    path = "/api/forms/submissions/{id}",
    params(("id" = String, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission", body = Submission),
        (status = 404, description = "Submission not found")
    ),
    tag = "forms"
)]
pub async fn get_submission(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Submission>>> {
    let submission = state.service.get_submission(&id).await?;
    Ok(Json(ApiResponse::success(submission, "Submission retrieved successfully")))
}

/// Validate a record against a stored schema without storing it
#[utoipa::path(
    post,
    path = "/api/forms/validate",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Validation passed"),
        (status = 400, description = "Field errors"),
        (status = 404, description = "Schema not found")
    ),
    tag = "forms"
)]
pub async fn validate(
    State(state): State<Arc<ApiState>>,
    AppJson(request): AppJson<ValidateRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let (Some(schema_name), Some(data)) = (request.schema_name, request.data) else {
        return Err(ApiError::BadRequest("Both schemaName and data are required".into()));
    };

    let errors = state.service.validate(&schema_name, &data).await?;
    if !errors.is_empty() {
        return Err(FormsError::ValidationFailed(errors).into());
    }
    Ok(Json(ApiResponse::ok("Validation passed")))
}
