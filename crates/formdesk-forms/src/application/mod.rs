//! Application layer
//!
//! [`FormService`] orchestrates intake, schema management and reporting on
//! top of the repository ports.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analytics::{AnalyticsAggregator, AnalyticsSnapshot};
use crate::domain::aggregates::{FormSchema, PatternPolicy, Submission, SubmissionData};
use crate::domain::value_objects::FieldError;
use crate::error::{FormsError, Result};
use crate::intake::{fingerprint, sanitize};
use crate::ports::{RepositoryError, SchemaRepository, SubmissionRepository};
use crate::validation::validate_record;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Requested page, 1-based. Missing or zero values fall back to defaults.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query, rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page: Some(page), per_page: Some(per_page) }
    }

    fn resolve(self) -> (u32, u32) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let per_page = self.per_page.filter(|p| *p > 0).unwrap_or(DEFAULT_PER_PAGE).min(MAX_PER_PAGE);
        (page, per_page)
    }
}

/// Paginated result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", aliases(SubmissionPage = Page<Submission>))]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Form intake and reporting service
pub struct FormService {
    submissions: Arc<dyn SubmissionRepository>,
    schemas: Arc<dyn SchemaRepository>,
    analytics: AnalyticsAggregator,
    pattern_policy: PatternPolicy,
}

impl FormService {
    pub fn new(submissions: Arc<dyn SubmissionRepository>, schemas: Arc<dyn SchemaRepository>) -> Self {
        Self {
            submissions,
            schemas,
            analytics: AnalyticsAggregator::default(),
            pattern_policy: PatternPolicy::default(),
        }
    }

    pub fn with_analytics(mut self, analytics: AnalyticsAggregator) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_pattern_policy(mut self, policy: PatternPolicy) -> Self {
        self.pattern_policy = policy;
        self
    }

    // ---------------------------------------------------------------------
    // Intake
    // ---------------------------------------------------------------------

    /// Sanitize, deduplicate and store a record.
    pub async fn submit(&self, raw: &SubmissionData) -> Result<Submission> {
        self.submit_for_schema(raw, None).await
    }

    /// Like [`FormService::submit`], validating against a stored schema first
    /// when `schema_name` is given. A rejected record is never written.
    pub async fn submit_for_schema(&self, raw: &SubmissionData, schema_name: Option<&str>) -> Result<Submission> {
        let data = sanitize(raw);
        if data.is_empty() {
            return Err(FormsError::EmptySubmission);
        }

        if let Some(name) = schema_name {
            let schema = self.get_schema(name).await?;
            let errors = validate_record(&schema, &data);
            if !errors.is_empty() {
                debug!(schema = %name, errors = errors.len(), "submission failed validation");
                return Err(FormsError::ValidationFailed(errors));
            }
        }

        let hash = fingerprint(&data);
        let submission = Submission::create(data);

        match self.submissions.insert(&submission, &hash).await {
            Ok(()) => {
                info!(id = %submission.id, fingerprint = %hash.short(), "submission stored");
                Ok(submission)
            }
            Err(RepositoryError::Conflict(reason)) => {
                warn!(fingerprint = %hash.short(), %reason, "duplicate submission rejected");
                Err(FormsError::DuplicateSubmission)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Validate a record against a stored schema without storing it.
    pub async fn validate(&self, schema_name: &str, data: &SubmissionData) -> Result<Vec<FieldError>> {
        let schema = self.get_schema(schema_name).await?;
        Ok(validate_record(&schema, data))
    }

    // ---------------------------------------------------------------------
    // Schemas
    // ---------------------------------------------------------------------

    /// Check the definition and upsert it by name.
    pub async fn save_schema(&self, schema: FormSchema) -> Result<FormSchema> {
        let errors = schema.check_definition(self.pattern_policy);
        if !errors.is_empty() {
            return Err(FormsError::InvalidSchema(errors));
        }
        let saved = self.schemas.upsert(&schema).await?;
        info!(schema = %saved.name, fields = saved.fields.len(), "schema saved");
        Ok(saved)
    }

    pub async fn get_schema(&self, name: &str) -> Result<FormSchema> {
        self.schemas
            .find_by_name(name)
            .await?
            .ok_or_else(|| FormsError::SchemaNotFound(name.to_string()))
    }

    pub async fn list_schemas(&self) -> Result<Vec<FormSchema>> {
        Ok(self.schemas.list().await?)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub async fn list_submissions(&self, request: PageRequest) -> Result<Page<Submission>> {
        let (page, per_page) = request.resolve();
        let total = self.submissions.count().await?;
        let offset = (page as usize - 1).saturating_mul(per_page as usize);
        let items = self.submissions.find_page(offset, per_page as usize).await?;
        let total_pages = u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX);

        Ok(Page { items, total, page, per_page, total_pages })
    }

    /// Malformed ids are reported as not found.
    pub async fn get_submission(&self, id: &str) -> Result<Submission> {
        let not_found = || FormsError::SubmissionNotFound(id.to_string());
        let uuid = Uuid::parse_str(id).map_err(|_| not_found())?;
        self.submissions.find_by_id(&uuid).await?.ok_or_else(not_found)
    }

    /// Recompute the snapshot over every stored submission.
    pub async fn analytics(&self) -> Result<AnalyticsSnapshot> {
        let all = self.submissions.find_all().await?;
        Ok(self.analytics.compute(&all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{FieldDescriptor, FieldType};
    use crate::infrastructure::persistence::{InMemorySchemaRepository, InMemorySubmissionRepository};
    use serde_json::{json, Value};

    fn service() -> FormService {
        FormService::new(
            Arc::new(InMemorySubmissionRepository::new()),
            Arc::new(InMemorySchemaRepository::new()),
        )
    }

    fn record(value: Value) -> SubmissionData {
        value.as_object().cloned().unwrap()
    }

    fn registration() -> FormSchema {
        FormSchema::new(
            "user-registration",
            vec![
                FieldDescriptor::new("firstName", FieldType::Text, "First Name").required(),
                FieldDescriptor::new("email", FieldType::Email, "Email").required(),
            ],
        )
    }

    #[tokio::test]
    async fn test_duplicate_law() {
        let service = service();
        let original = record(json!({ "name": "Ada", "age": 36, "tags": ["x"] }));

        let stored = service.submit(&original).await.unwrap();
        assert_eq!(stored.data, original);

        let reordered = record(json!({ "tags": ["x"], "age": 36.0, "name": "  Ada " }));
        assert!(matches!(service.submit(&reordered).await, Err(FormsError::DuplicateSubmission)));

        let changed = record(json!({ "name": "Ada", "age": 37, "tags": ["x"] }));
        assert!(service.submit(&changed).await.is_ok());

        assert_eq!(service.list_submissions(PageRequest::default()).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_empty_after_sanitize_rejected() {
        let service = service();
        let err = service.submit(&record(json!({ "a": null }))).await.unwrap_err();
        assert!(matches!(err, FormsError::EmptySubmission));
    }

    #[tokio::test]
    async fn test_submit_against_schema() {
        let service = service();
        service.save_schema(registration()).await.unwrap();

        let err = service
            .submit_for_schema(&record(json!({ "firstName": "Ada" })), Some("user-registration"))
            .await
            .unwrap_err();
        let errors = err.field_errors().unwrap();
        assert_eq!(errors, &[FieldError::new("email", "Email is required")]);
        assert_eq!(service.list_submissions(PageRequest::default()).await.unwrap().total, 0);

        let ok = service
            .submit_for_schema(
                &record(json!({ "firstName": "Ada", "email": " ada@example.com " })),
                Some("user-registration"),
            )
            .await
            .unwrap();
        assert_eq!(ok.data["email"], json!("ada@example.com"));

        let missing = service.submit_for_schema(&record(json!({ "x": 1 })), Some("nope")).await;
        assert!(matches!(missing, Err(FormsError::SchemaNotFound(name)) if name == "nope"));
    }

    #[tokio::test]
    async fn test_validate_only() {
        let service = service();
        service.save_schema(registration()).await.unwrap();

        let errors = service.validate("user-registration", &SubmissionData::new()).await.unwrap();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["firstName", "email"]);

        assert!(matches!(
            service.validate("unknown", &SubmissionData::new()).await,
            Err(FormsError::SchemaNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_schema_not_saved() {
        let service = service().with_pattern_policy(PatternPolicy::Strict);
        let bad = FormSchema::new(
            "bad name",
            vec![FieldDescriptor::new("code", FieldType::Text, "Code").with_pattern("([a-z", None)],
        );

        let err = service.save_schema(bad).await.unwrap_err();
        assert_eq!(err.field_errors().map(<[FieldError]>::len), Some(2));
        assert!(service.list_schemas().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pagination() {
        let service = service();
        for i in 0..25 {
            service.submit(&record(json!({ "n": i }))).await.unwrap();
        }

        let first = service.list_submissions(PageRequest::default()).await.unwrap();
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items[0].data["n"], json!(24));

        let second = service.list_submissions(PageRequest::new(2, 20)).await.unwrap();
        assert_eq!(second.items.len(), 5);

        let capped = service.list_submissions(PageRequest::new(1, 500)).await.unwrap();
        assert_eq!(capped.per_page, MAX_PER_PAGE);
        assert_eq!(capped.items.len(), 25);
    }

    #[tokio::test]
    async fn test_get_submission() {
        let service = service();
        let stored = service.submit(&record(json!({ "k": "v" }))).await.unwrap();

        assert_eq!(service.get_submission(&stored.id.to_string()).await.unwrap(), stored);
        assert!(matches!(
            service.get_submission("not-a-uuid").await,
            Err(FormsError::SubmissionNotFound(_))
        ));
        assert!(matches!(
            service.get_submission(&Uuid::new_v4().to_string()).await,
            Err(FormsError::SubmissionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_analytics_reflects_store() {
        let service = service();
        service.submit(&record(json!({ "gender": "Male", "age": 30 }))).await.unwrap();
        service.submit(&record(json!({ "Gender": "Female", "age": "40" }))).await.unwrap();

        let snapshot = service.analytics().await.unwrap();
        assert_eq!(snapshot.total_submissions, 2);
        assert_eq!(snapshot.average_age, Some(35.0));
        assert_eq!(snapshot, service.analytics().await.unwrap());
    }
}
