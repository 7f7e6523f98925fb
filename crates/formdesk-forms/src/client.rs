//! Client-side record preparation.
//!
//! Used by front ends that collect raw input per field before submitting.

use serde_json::Value;

use crate::coerce;
use crate::domain::aggregates::SubmissionData;
use crate::domain::value_objects::{FieldDescriptor, FieldType};

/// Shape a raw record for submission.
///
/// Numbers become JSON numbers and dates become `YYYY-MM-DDTHH:MM:SS.sssZ`;
/// everything else is sent as a trimmed string. Empty values and keys that
/// are not schema fields are dropped. A value that does not coerce is passed
/// on as text so server-side validation reports it.
pub fn format_record(fields: &[FieldDescriptor], data: &SubmissionData) -> SubmissionData {
    fields
        .iter()
        .filter_map(|field| {
            let value = data.get(&field.name).filter(|v| !coerce::is_empty(Some(v)))?;
            Some((field.name.clone(), format_value(field.field_type, value)))
        })
        .collect()
}

fn format_value(field_type: FieldType, value: &Value) -> Value {
    let fallback = || Value::String(coerce::text(value).trim().to_string());
    match field_type {
        FieldType::Number => coerce::number(value).map(coerce::number_value).unwrap_or_else(fallback),
        FieldType::Date => coerce::date(value)
            .map(|dt| Value::String(coerce::iso_timestamp(&dt)))
            .unwrap_or_else(fallback),
        _ => fallback(),
    }
}

/// Starting value per field: the first option for dropdowns, otherwise `""`.
pub fn initial_values(fields: &[FieldDescriptor]) -> SubmissionData {
    fields
        .iter()
        .map(|field| {
            let initial = match (field.field_type, &field.options) {
                (FieldType::Dropdown, Some(options)) => options.first().cloned().unwrap_or_default(),
                _ => String::new(),
            };
            (field.name.clone(), Value::String(initial))
        })
        .collect()
}
