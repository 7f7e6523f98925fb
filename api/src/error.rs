//! HTTP error mapping

use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use formdesk_forms::FormsError;
use serde::Serialize;

use crate::models::ApiResponse;

/// Errors surfaced by handlers and middleware
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Forms(#[from] FormsError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forms(err) => match err {
                FormsError::DuplicateSubmission => StatusCode::CONFLICT,
                FormsError::SchemaNotFound(_) | FormsError::SubmissionNotFound(_) => StatusCode::NOT_FOUND,
                FormsError::EmptySubmission | FormsError::InvalidSchema(_) | FormsError::ValidationFailed(_) => {
                    StatusCode::BAD_REQUEST
                }
                FormsError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn body(self) -> ApiResponse<()> {
        match self {
            Self::Forms(FormsError::DuplicateSubmission) => ApiResponse::error(
                "Duplicate submission detected",
                "DUPLICATE_SUBMISSION",
                "This form has already been submitted with the same data",
            ),
            Self::Forms(FormsError::SchemaNotFound(name)) => ApiResponse::error(
                "Schema not found",
                "SCHEMA_NOT_FOUND",
                &format!("No form schema found with the name '{name}'"),
            ),
            Self::Forms(FormsError::SubmissionNotFound(_)) => ApiResponse::error(
                "Submission not found",
                "SUBMISSION_NOT_FOUND",
                "No submission found with the provided ID",
            ),
            Self::Forms(FormsError::EmptySubmission) => {
                ApiResponse::error("Form data cannot be empty", "EMPTY_SUBMISSION", "Form data is required")
            }
            Self::Forms(FormsError::InvalidSchema(errors) | FormsError::ValidationFailed(errors)) => {
                ApiResponse::validation(errors)
            }
            Self::Forms(FormsError::Persistence(err)) => {
                tracing::error!(error = %err, "persistence failure");
                ApiResponse::error("Internal server error", "INTERNAL_ERROR", "Something went wrong")
            }
            Self::BadRequest(detail) => ApiResponse::error("Invalid request", "BAD_REQUEST", &detail),
            Self::RouteNotFound(detail) => ApiResponse::error("Route not found", "NOT_FOUND", &detail),
            Self::RateLimited { .. } => ApiResponse::error(
                "Too many requests from this IP, please try again later",
                "RATE_LIMITED",
                "Rate limit exceeded",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            Self::RateLimited { retry_after } => Some(retry_after.as_secs().max(1)),
            _ => None,
        };

        let mut response = (status, Json(self.body())).into_response();
        if let Some(secs) = retry_after {
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// `Json` whose rejection renders as the standard envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
