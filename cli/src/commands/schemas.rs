//! Schema commands

use formdesk_forms::{FieldDescriptor, FormSchema};
use tabled::Tabled;

use super::{read_document, ApiClient};
use crate::output::{truncate, OutputFormat};
use crate::SchemaCommands;

#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    field_type: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Required")]
    required: bool,
    #[tabled(rename = "Constraints")]
    constraints: String,
}

impl From<&FieldDescriptor> for FieldRow {
    fn from(field: &FieldDescriptor) -> Self {
        Self {
            name: field.name.clone(),
            field_type: field.field_type.to_string(),
            label: field.label.clone(),
            required: field.required,
            constraints: constraints(field),
        }
    }
}

pub async fn handle(action: SchemaCommands, client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        SchemaCommands::Push { file } => {
            let schema: FormSchema = read_document(Some(file.as_str()), None)?;
            let saved: FormSchema = client.post("/api/forms/schema", &schema).await?;
            println!("Schema '{}' saved with {} fields", saved.name, saved.fields.len());
        }
        SchemaCommands::Get { name } => {
            let schema = fetch(client, &name).await?;
            format.print(&schema, |s| s.fields.iter().map(FieldRow::from).collect())?;
        }
        SchemaCommands::List => {
            let schemas: Vec<FormSchema> = client.get("/api/forms/schemas").await?;
            format.print(&schemas, |list| {
                list.iter()
                    .map(|s| SchemaRow {
                        name: s.name.clone(),
                        fields: s.fields.len(),
                        description: truncate(s.description.as_deref().unwrap_or(""), 40),
                    })
                    .collect()
            })?;
        }
    }
    Ok(())
}

pub async fn fetch(client: &ApiClient, name: &str) -> anyhow::Result<FormSchema> {
    client.get(&format!("/api/forms/schema/{name}")).await
}

fn constraints(field: &FieldDescriptor) -> String {
    let mut parts = Vec::new();
    if field.min_length.is_some() || field.max_length.is_some() {
        parts.push(format!("length {}", bounds(field.min_length, field.max_length)));
    }
    if field.min.is_some() || field.max.is_some() {
        parts.push(format!("range {}", bounds(field.min, field.max)));
    }
    if let Some(options) = &field.options {
        parts.push(format!("one of {}", options.join("/")));
    }
    if let Some(pattern) = field.pattern() {
        parts.push(format!("matches {}", truncate(pattern, 24)));
    }
    parts.join(", ")
}

fn bounds<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    let show = |v: Option<T>| v.map(|v| v.to_string()).unwrap_or_default();
    format!("{}..{}", show(min), show(max))
}
