//! Interactive form filling
//!
//! Prompts for every field of a stored schema, re-asking until the answer
//! passes field validation, then submits the record.

use std::io::{self, BufRead, Write};

use anyhow::bail;
use colored::Colorize;
use formdesk_forms::client::{format_record, initial_values};
use formdesk_forms::{validate_field, validate_record, FieldDescriptor, FieldType, SubmissionData};
use serde_json::Value;

use super::{schemas, submissions, ApiClient};

pub async fn handle(client: &ApiClient, schema_name: &str) -> anyhow::Result<()> {
    let schema = schemas::fetch(client, schema_name).await?;
    println!("{}", schema.name.bold());
    if let Some(description) = &schema.description {
        println!("{description}");
    }

    let raw = {
        let stdin = io::stdin();
        let stdout = io::stdout();
        prompt_record(&schema.fields, &mut stdin.lock(), &mut stdout.lock())?
    };

    let data = format_record(&schema.fields, &raw);
    let errors = validate_record(&schema, &data);
    if !errors.is_empty() {
        submissions::print_errors(&errors);
        bail!("Please fix the errors in the form");
    }
    submissions::send(client, Some(&schema.name), &data).await
}

/// Ask for each field in order. Blank input keeps the field's initial value.
pub fn prompt_record<R: BufRead, W: Write>(
    fields: &[FieldDescriptor],
    input: &mut R,
    output: &mut W,
) -> io::Result<SubmissionData> {
    let initial = initial_values(fields);
    let mut record = SubmissionData::new();

    for field in fields {
        let default = initial.get(&field.name).and_then(Value::as_str).unwrap_or_default();
        loop {
            write!(output, "{}", question(field, default))?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before the form was complete"));
            }
            let answer = resolve_answer(field, line.trim(), default);
            let value = Value::String(answer);

            match validate_field(field, Some(&value)) {
                Some(message) => writeln!(output, "  {}", message.red())?,
                None => {
                    record.insert(field.name.clone(), value);
                    break;
                }
            }
        }
    }
    Ok(record)
}

fn question(field: &FieldDescriptor, default: &str) -> String {
    let mut text = field.label.clone();
    if field.required {
        text.push_str(" *");
    }
    if let (FieldType::Dropdown, Some(options)) = (field.field_type, &field.options) {
        let numbered: Vec<String> = options.iter().enumerate().map(|(i, o)| format!("{}) {o}", i + 1)).collect();
        text.push_str(&format!(" [{}]", numbered.join(", ")));
    } else if let Some(placeholder) = &field.placeholder {
        text.push_str(&format!(" ({placeholder})"));
    }
    if !default.is_empty() {
        text.push_str(&format!(" <{default}>"));
    }
    text.push_str(": ");
    text
}

/// Blank keeps `default`; a dropdown also accepts the 1-based option number.
fn resolve_answer(field: &FieldDescriptor, answer: &str, default: &str) -> String {
    if answer.is_empty() {
        return default.to_string();
    }
    if field.field_type == FieldType::Dropdown {
        if let (Some(options), Ok(index)) = (&field.options, answer.parse::<usize>()) {
            if let Some(option) = index.checked_sub(1).and_then(|i| options.get(i)) {
                return option.clone();
            }
        }
    }
    answer.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdesk_forms::FormSchema;
    use serde_json::json;
    use std::io::Cursor;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("firstName", FieldType::Text, "First Name")
                .required()
                .with_length(Some(2), None),
            FieldDescriptor::new("age", FieldType::Number, "Age").with_range(Some(13.0), Some(120.0)),
            FieldDescriptor::new("gender", FieldType::Dropdown, "Gender").with_options(["Male", "Female", "Other"]),
        ]
    }

    fn run(input: &str) -> (io::Result<SubmissionData>, String) {
        let mut output = Vec::new();
        let result = prompt_record(&fields(), &mut Cursor::new(input), &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_reprompts_until_valid() {
        let (result, output) = run("A\nAda\n7\n36\n2\n");
        let record = result.unwrap();
        assert_eq!(record.get("firstName"), Some(&json!("Ada")));
        assert_eq!(record.get("age"), Some(&json!("36")));
        assert_eq!(record.get("gender"), Some(&json!("Female")));
        assert!(output.contains("First Name must be at least 2 characters long"));
        assert!(output.contains("Value must be at least 13"));
    }

    #[test]
    fn test_blank_keeps_initial_value() {
        let (result, output) = run("Ada\n\n\n");
        let record = result.unwrap();
        assert_eq!(record.get("age"), Some(&json!("")));
        assert_eq!(record.get("gender"), Some(&json!("Male")));
        assert!(output.contains("<Male>"));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let (result, _) = run("Ada\n");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_formatted_answers_pass_record_validation() {
        let (result, _) = run("Ada\n36\nOther\n");
        let schema = FormSchema::new("profile", fields());
        let data = format_record(&schema.fields, &result.unwrap());
        assert_eq!(data.get("age"), Some(&json!(36)));
        assert!(validate_record(&schema, &data).is_empty());
    }
}
