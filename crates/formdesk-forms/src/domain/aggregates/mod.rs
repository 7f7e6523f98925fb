//! Form aggregates
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{FieldDescriptor, FieldError, FieldType};
use crate::validation::pattern;

pub const MAX_SCHEMA_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_FIELDS: usize = 20;
pub const MAX_FIELD_NAME_LEN: usize = 50;
pub const MAX_LABEL_LEN: usize = 100;
pub const MAX_PLACEHOLDER_LEN: usize = 200;
pub const MAX_PATTERN_MESSAGE_LEN: usize = 200;

/// Submitted field values keyed by field name.
pub type SubmissionData = serde_json::Map<String, serde_json::Value>;

/// Named, ordered collection of field descriptors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FormSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

/// How a schema save treats a `validation.pattern` that does not compile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternPolicy {
    /// Accept the schema; the pattern is skipped at validation time.
    #[default]
    Lenient,
    /// Reject the schema save.
    Strict,
}

impl FormSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self { name: name.into(), description: None, fields }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the definition before it is stored. Every violation is reported.
    pub fn check_definition(&self, policy: PatternPolicy) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let name_len = self.name.chars().count();
        if name_len == 0 {
            errors.push(FieldError::new("name", "Name is required"));
        } else if name_len > MAX_SCHEMA_NAME_LEN {
            errors.push(FieldError::new("name", "Name cannot exceed 100 characters"));
        } else if !is_schema_name(&self.name) {
            errors.push(FieldError::new(
                "name",
                "Name must contain only letters, numbers, hyphens, and underscores",
            ));
        }

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                errors.push(FieldError::new("description", "Description cannot exceed 500 characters"));
            }
        }

        if self.fields.is_empty() {
            errors.push(FieldError::new("fields", "At least one field is required"));
        } else if self.fields.len() > MAX_FIELDS {
            errors.push(FieldError::new("fields", "Cannot have more than 20 fields"));
        }

        let mut seen = HashSet::new();
        for (index, field) in self.fields.iter().enumerate() {
            check_field(index, field, policy, &mut errors);
            if !field.name.is_empty() && !seen.insert(field.name.as_str()) {
                errors.push(FieldError::new(
                    format!("fields.{index}.name"),
                    format!("Duplicate field name '{}'", field.name),
                ));
            }
        }

        errors
    }
}

fn check_field(index: usize, field: &FieldDescriptor, policy: PatternPolicy, errors: &mut Vec<FieldError>) {
    let path = |key: &str| format!("fields.{index}.{key}");

    let name_len = field.name.chars().count();
    if name_len == 0 {
        errors.push(FieldError::new(path("name"), "Field name is required"));
    } else if name_len > MAX_FIELD_NAME_LEN {
        errors.push(FieldError::new(path("name"), "Field name cannot exceed 50 characters"));
    } else if !is_field_name(&field.name) {
        errors.push(FieldError::new(
            path("name"),
            "Field name must start with a letter and contain only letters, numbers, and underscores",
        ));
    }

    let label_len = field.label.chars().count();
    if label_len == 0 {
        errors.push(FieldError::new(path("label"), "Field label cannot be empty"));
    } else if label_len > MAX_LABEL_LEN {
        errors.push(FieldError::new(path("label"), "Field label cannot exceed 100 characters"));
    }

    if field.placeholder.as_ref().is_some_and(|p| p.chars().count() > MAX_PLACEHOLDER_LEN) {
        errors.push(FieldError::new(path("placeholder"), "Placeholder cannot exceed 200 characters"));
    }

    if field.max_length == Some(0) {
        errors.push(FieldError::new(path("maxLength"), "maxLength must be at least 1"));
    }
    if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
        if min > max {
            errors.push(FieldError::new(path("minLength"), "minLength cannot exceed maxLength"));
        }
    }
    if let (Some(min), Some(max)) = (field.min, field.max) {
        if min > max {
            errors.push(FieldError::new(path("min"), "min cannot exceed max"));
        }
    }
    if [field.min, field.max].iter().flatten().any(|bound| !bound.is_finite()) {
        errors.push(FieldError::new(path("min"), "Numeric bounds must be finite"));
    }

    if field.field_type == FieldType::Dropdown && field.options.as_ref().is_some_and(Vec::is_empty) {
        errors.push(FieldError::new(path("options"), "Dropdown fields need at least one option"));
    }

    if let Some(rule) = &field.validation {
        if rule.message.as_ref().is_some_and(|m| m.chars().count() > MAX_PATTERN_MESSAGE_LEN) {
            errors.push(FieldError::new(
                path("validation.message"),
                "Validation message cannot exceed 200 characters",
            ));
        }
        if policy == PatternPolicy::Strict {
            if let Some(source) = field.pattern() {
                if let Err(err) = pattern::compile(source) {
                    errors.push(FieldError::new(
                        path("validation.pattern"),
                        format!("Invalid pattern: {err}"),
                    ));
                }
            }
        }
    }
}

fn is_schema_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One persisted data record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: SubmissionData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn create(data: SubmissionData) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), data, created_at: now, updated_at: now }
    }
}
