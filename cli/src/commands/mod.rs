//! CLI Commands

pub mod analytics;
pub mod config;
pub mod fill;
pub mod schemas;
pub mod submissions;

use std::fmt;

use formdesk_forms::FieldError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Response envelope returned by the API
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
    error: Option<ErrorDetail>,
    errors: Option<Vec<FieldError>>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// A request the API answered with `success: false`.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub code: Option<String>,
    pub message: String,
    pub detail: Option<String>,
    pub errors: Vec<FieldError>,
}

impl ApiFailure {
    pub fn is_duplicate(&self) -> bool {
        self.status == StatusCode::CONFLICT || self.code.as_deref() == Some("DUPLICATE_SUBMISSION")
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiFailure {}

/// API client
pub struct ApiClient {
    pub base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::decode(resp).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::decode(resp).await
    }

    /// POST where only the envelope message matters.
    pub async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<String> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        let (_, message) = Self::envelope::<serde_json::Value>(resp).await?;
        Ok(message)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
        let (data, _) = Self::envelope(resp).await?;
        data.ok_or_else(|| anyhow::anyhow!("No data in response"))
    }

    async fn envelope<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<(Option<T>, String)> {
        let status = resp.status();
        let envelope: Envelope<T> = resp.json().await?;
        let message = envelope.message.unwrap_or_default();

        if !envelope.success || !status.is_success() {
            let (code, detail) = match envelope.error {
                Some(ErrorDetail { code, message }) => (Some(code), Some(message)),
                None => (None, None),
            };
            return Err(ApiFailure {
                status,
                code,
                message,
                detail,
                errors: envelope.errors.unwrap_or_default(),
            }
            .into());
        }
        Ok((envelope.data, message))
    }
}

/// Parse a JSON or YAML object from a file (by extension) or inline text.
pub fn read_document<T: DeserializeOwned>(file: Option<&str>, inline: Option<&str>) -> anyhow::Result<T> {
    match (file, inline) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)?;
            if path.ends_with(".yaml") || path.ends_with(".yml") {
                Ok(serde_yaml::from_str(&content)?)
            } else {
                Ok(serde_json::from_str(&content)?)
            }
        }
        (None, Some(text)) => Ok(serde_json::from_str(text)?),
        (None, None) => Err(anyhow::anyhow!("Provide --file or --data")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_failure_display_lists_field_errors() {
        let failure = ApiFailure {
            status: StatusCode::BAD_REQUEST,
            code: Some("VALIDATION_FAILED".into()),
            message: "Validation failed".into(),
            detail: None,
            errors: vec![FieldError::new("email", "Email is required")],
        };
        let text = failure.to_string();
        assert!(text.starts_with("Validation failed (400 Bad Request)"));
        assert!(text.contains("email: Email is required"));
    }

    #[test]
    fn test_read_document_yaml_and_inline() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "name: contact\nfields: []").unwrap();
        let doc: serde_json::Value = read_document(file.path().to_str(), None).unwrap();
        assert_eq!(doc["name"], "contact");

        let inline: serde_json::Value = read_document(None, Some(r#"{"a": 1}"#)).unwrap();
        assert_eq!(inline["a"], 1);

        assert!(read_document::<serde_json::Value>(None, None).is_err());
    }
}
