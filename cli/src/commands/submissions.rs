//! Submission commands

use anyhow::bail;
use colored::Colorize;
use formdesk_forms::client::format_record;
use formdesk_forms::{validate_record, FieldError, FormSchema, Page, Submission, SubmissionData};
use serde_json::json;
use tabled::Tabled;

use super::{analytics, read_document, schemas, ApiClient, ApiFailure};
use crate::output::{truncate, OutputFormat};
use crate::SubmissionCommands;

#[derive(Tabled)]
struct SubmissionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Submitted")]
    created_at: String,
    #[tabled(rename = "Data")]
    data: String,
}

impl From<&Submission> for SubmissionRow {
    fn from(s: &Submission) -> Self {
        Self {
            id: s.id.to_string(),
            created_at: s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            data: truncate(&preview(&s.data), 60),
        }
    }
}

pub async fn handle(action: SubmissionCommands, client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        SubmissionCommands::List { page, per_page } => {
            let page: Page<Submission> = client
                .get(&format!("/api/forms/submissions?page={page}&perPage={per_page}"))
                .await?;
            format.print(&page, |p| p.items.iter().map(SubmissionRow::from).collect())?;
            if format == OutputFormat::Table {
                println!("Page {} of {} ({} total)", page.page, page.total_pages.max(1), page.total);
            }
        }
        SubmissionCommands::Get { id } => {
            let submission: Submission = client.get(&format!("/api/forms/submissions/{id}")).await?;
            format.print(&submission, |s| vec![SubmissionRow::from(s)])?;
        }
    }
    Ok(())
}

/// Submit a record, shaping and checking it locally when a schema is known.
pub async fn submit(client: &ApiClient, schema_name: Option<&str>, raw: SubmissionData) -> anyhow::Result<()> {
    let schema = match schema_name {
        Some(name) => Some(schemas::fetch(client, name).await?),
        None => None,
    };
    let data = prepare(schema.as_ref(), &raw)?;
    send(client, schema_name, &data).await
}

/// Post prepared data and print the refreshed analytics summary.
pub async fn send(client: &ApiClient, schema_name: Option<&str>, data: &SubmissionData) -> anyhow::Result<()> {
    let body = json!({ "data": data, "schemaName": schema_name });
    let submission: Submission = match client.post("/api/forms/submit", &body).await {
        Ok(submission) => submission,
        Err(e) => {
            if e.downcast_ref::<ApiFailure>().is_some_and(ApiFailure::is_duplicate) {
                bail!("This form has already been submitted with the same data");
            }
            return Err(e);
        }
    };
    println!("{} Form submitted successfully ({})", "✓".green(), submission.id);

    match analytics::fetch(client).await {
        Ok(dashboard) => println!("{}", dashboard.summary()),
        Err(e) => tracing::warn!("Could not refresh analytics: {e}"),
    }
    Ok(())
}

pub async fn validate(client: &ApiClient, schema_name: &str, raw: SubmissionData) -> anyhow::Result<()> {
    let schema = schemas::fetch(client, schema_name).await?;
    let data = format_record(&schema.fields, &raw);
    let body = json!({ "schemaName": schema_name, "data": data });
    let message = client.post_unit("/api/forms/validate", &body).await?;
    println!("{} {message}", "✓".green());
    Ok(())
}

/// Format against the schema and stop on local field errors.
fn prepare(schema: Option<&FormSchema>, raw: &SubmissionData) -> anyhow::Result<SubmissionData> {
    let Some(schema) = schema else {
        return Ok(raw.clone());
    };
    let data = format_record(&schema.fields, raw);
    let errors = validate_record(schema, &data);
    if !errors.is_empty() {
        print_errors(&errors);
        bail!("Please fix the errors in the form");
    }
    Ok(data)
}

pub fn print_errors(errors: &[FieldError]) {
    for error in errors {
        eprintln!("  {} {}", format!("{}:", error.field).red(), error.message);
    }
}

/// Record from `--file`/`--data`.
pub fn read_record(file: Option<&str>, data: Option<&str>) -> anyhow::Result<SubmissionData> {
    read_document(file, data)
}

fn preview(data: &SubmissionData) -> String {
    data.iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdesk_forms::{FieldDescriptor, FieldType};

    fn schema() -> FormSchema {
        FormSchema::new(
            "contact",
            vec![
                FieldDescriptor::new("email", FieldType::Email, "Email").required(),
                FieldDescriptor::new("age", FieldType::Number, "Age").with_range(Some(13.0), None),
            ],
        )
    }

    fn record(value: serde_json::Value) -> SubmissionData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_prepare_formats_known_fields() {
        let raw = record(json!({"email": " a@b.co ", "age": "42", "extra": "x"}));
        let data = prepare(Some(&schema()), &raw).unwrap();
        assert_eq!(data.get("email"), Some(&json!("a@b.co")));
        assert_eq!(data.get("age"), Some(&json!(42)));
        assert!(!data.contains_key("extra"));
    }

    #[test]
    fn test_prepare_stops_on_field_errors() {
        let raw = record(json!({"age": "5"}));
        assert!(prepare(Some(&schema()), &raw).is_err());
    }

    #[test]
    fn test_prepare_without_schema_passes_through() {
        let raw = record(json!({"anything": "goes"}));
        assert_eq!(prepare(None, &raw).unwrap(), raw);
    }

    #[test]
    fn test_preview() {
        let data = record(json!({"age": 30, "name": "Ada"}));
        assert_eq!(preview(&data), "age=30, name=Ada");
    }
}
