//! API Models

use formdesk_forms::{FieldError, SubmissionData};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard API response envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.to_string()),
            error: None,
            errors: None,
        }
    }

    /// Success without a payload.
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.to_string()),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: &str, code: &str, detail: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
            error: Some(ErrorResponse { code: code.to_string(), message: detail.to_string() }),
            errors: None,
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            error: Some(ErrorResponse {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} field(s) failed validation", errors.len()),
            }),
            errors: Some(errors),
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Submission request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[schema(value_type = Object)]
    pub data: SubmissionData,
    /// Validate against this stored schema before storing.
    #[serde(default)]
    pub schema_name: Option<String>,
}

/// Validate-only request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub schema_name: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub data: Option<SubmissionData>,
}
