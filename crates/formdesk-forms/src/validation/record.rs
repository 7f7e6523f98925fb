use crate::domain::aggregates::{FormSchema, SubmissionData};
use crate::domain::value_objects::FieldError;

use super::validate_field;

/// Validate `data` against every field of `schema`, in schema order.
///
/// Keys in `data` that the schema does not declare are ignored. An empty
/// result means the record passed.
pub fn validate_record(schema: &FormSchema, data: &SubmissionData) -> Vec<FieldError> {
    schema
        .fields
        .iter()
        .filter_map(|field| {
            validate_field(field, data.get(&field.name))
                .map(|message| FieldError::new(field.name.clone(), message))
        })
        .collect()
}
