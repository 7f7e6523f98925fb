use serde_json::Value;

use crate::coerce;
use crate::domain::value_objects::{FieldDescriptor, FieldType};

use super::pattern;

const DEFAULT_PATTERN_MESSAGE: &str = "Invalid format";

/// Validate one candidate value against its descriptor.
///
/// Returns the message of the first failing check, or `None` if the value is
/// acceptable. Checks run in order: required, type-specific, custom pattern.
pub fn validate_field(field: &FieldDescriptor, value: Option<&Value>) -> Option<String> {
    if coerce::is_empty(value) {
        return field.required.then(|| format!("{} is required", field.label));
    }
    let value = value?;
    let text = coerce::text(value);

    check_type(field, value, &text).or_else(|| check_pattern(field, &text))
}

fn check_type(field: &FieldDescriptor, value: &Value, text: &str) -> Option<String> {
    match field.field_type {
        FieldType::Email => (!is_email(text)).then(|| "Please enter a valid email address".to_string()),
        FieldType::Number => check_number(field, value),
        FieldType::Date => coerce::date(value)
            .is_none()
            .then(|| "Please enter a valid date".to_string()),
        FieldType::Dropdown => match &field.options {
            Some(options) if !options.iter().any(|option| option == text) => {
                Some("Please select a valid option".to_string())
            }
            _ => None,
        },
        _ if field.field_type.is_textual() => check_length(field, text),
        _ => None,
    }
}

fn check_number(field: &FieldDescriptor, value: &Value) -> Option<String> {
    let Some(n) = coerce::number(value) else {
        return Some("Please enter a valid number".to_string());
    };
    if let Some(min) = field.min.filter(|min| n < *min) {
        return Some(format!("Value must be at least {min}"));
    }
    if let Some(max) = field.max.filter(|max| n > *max) {
        return Some(format!("Value must be at most {max}"));
    }
    None
}

fn check_length(field: &FieldDescriptor, text: &str) -> Option<String> {
    let len = text.chars().count();
    if let Some(min) = field.min_length.filter(|min| len < *min) {
        return Some(format!("{} must be at least {min} characters long", field.label));
    }
    if let Some(max) = field.max_length.filter(|max| len > *max) {
        return Some(format!("{} must be at most {max} characters long", field.label));
    }
    None
}

fn check_pattern(field: &FieldDescriptor, text: &str) -> Option<String> {
    let regex = pattern::cached(field.pattern()?)?;
    if pattern::matches(&regex, text) {
        return None;
    }
    let message = field
        .validation
        .as_ref()
        .and_then(|rule| rule.message.as_deref())
        .filter(|message| !message.is_empty())
        .unwrap_or(DEFAULT_PATTERN_MESSAGE);
    Some(message.to_string())
}

/// Single `@`, no whitespace, and a dot inside the domain part.
fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn age() -> FieldDescriptor {
        FieldDescriptor::new("age", FieldType::Number, "Age")
            .required()
            .with_range(Some(13.0), Some(120.0))
    }

    #[test]
    fn test_age_scenario() {
        let field = age();
        assert_eq!(validate_field(&field, Some(&json!(10))).as_deref(), Some("Value must be at least 13"));
        assert_eq!(validate_field(&field, Some(&json!("abc"))).as_deref(), Some("Please enter a valid number"));
        assert_eq!(validate_field(&field, Some(&json!(45))), None);
        assert_eq!(validate_field(&field, Some(&json!("45"))), None);
        assert_eq!(validate_field(&field, Some(&json!(121))).as_deref(), Some("Value must be at most 120"));
    }

    #[test]
    fn test_fractional_bounds_in_messages() {
        let field = FieldDescriptor::new("score", FieldType::Number, "Score").with_range(Some(0.5), None);
        assert_eq!(validate_field(&field, Some(&json!(0.1))).as_deref(), Some("Value must be at least 0.5"));
    }

    #[test]
    fn test_required_message_uses_label() {
        let field = FieldDescriptor::new("firstName", FieldType::Text, "First Name").required();
        assert_eq!(validate_field(&field, None).as_deref(), Some("First Name is required"));
        assert_eq!(validate_field(&field, Some(&Value::Null)).as_deref(), Some("First Name is required"));
        assert_eq!(validate_field(&field, Some(&json!(""))).as_deref(), Some("First Name is required"));
    }

    #[test]
    fn test_email() {
        let field = FieldDescriptor::new("email", FieldType::Email, "Email");
        assert_eq!(validate_field(&field, Some(&json!("john.doe@example.com"))), None);
        for bad in ["john", "john@", "@example.com", "a@b", "a@.com", "a@b.", "a b@c.com", "a@b@c.com"] {
            assert_eq!(
                validate_field(&field, Some(&json!(bad))).as_deref(),
                Some("Please enter a valid email address"),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_date() {
        let field = FieldDescriptor::new("birthDate", FieldType::Date, "Date of Birth");
        assert_eq!(validate_field(&field, Some(&json!("1995-03-15"))), None);
        assert_eq!(validate_field(&field, Some(&json!("1995-03-15T00:00:00.000Z"))), None);
        assert_eq!(validate_field(&field, Some(&json!("yesterday"))).as_deref(), Some("Please enter a valid date"));
    }

    #[test]
    fn test_dropdown() {
        let field = FieldDescriptor::new("gender", FieldType::Dropdown, "Gender").with_options(["Male", "Female"]);
        assert_eq!(validate_field(&field, Some(&json!("Female"))), None);
        assert_eq!(validate_field(&field, Some(&json!("female"))).as_deref(), Some("Please select a valid option"));

        let open = FieldDescriptor::new("gender", FieldType::Dropdown, "Gender");
        assert_eq!(validate_field(&open, Some(&json!("anything"))), None);
    }

    #[test]
    fn test_text_length() {
        let field = FieldDescriptor::new("lastName", FieldType::Password, "Last Name").with_length(Some(2), Some(4));
        assert_eq!(
            validate_field(&field, Some(&json!("D"))).as_deref(),
            Some("Last Name must be at least 2 characters long")
        );
        assert_eq!(
            validate_field(&field, Some(&json!("Doeee"))).as_deref(),
            Some("Last Name must be at most 4 characters long")
        );
        assert_eq!(validate_field(&field, Some(&json!("Doé"))), None);
    }

    #[test]
    fn test_length_ignored_for_non_text_types() {
        let field = FieldDescriptor::new("email", FieldType::Email, "Email").with_length(Some(50), Some(60));
        assert_eq!(validate_field(&field, Some(&json!("a@b.co"))), None);
    }

    #[test]
    fn test_pattern_after_type_checks() {
        let field = FieldDescriptor::new("phoneNumber", FieldType::Text, "Phone Number")
            .with_pattern("^[+]?[1-9]?[0-9]{7,15}$", Some("Please enter a valid phone number"));
        assert_eq!(validate_field(&field, Some(&json!("+1234567890"))), None);
        assert_eq!(
            validate_field(&field, Some(&json!("12-34"))).as_deref(),
            Some("Please enter a valid phone number")
        );
    }

    #[test]
    fn test_pattern_applies_to_numbers_via_string_form() {
        let field = FieldDescriptor::new("year", FieldType::Number, "Year").with_pattern("^[0-9]{4}$", None);
        assert_eq!(validate_field(&field, Some(&json!(1999))), None);
        assert_eq!(validate_field(&field, Some(&json!(99))).as_deref(), Some("Invalid format"));
    }

    #[test]
    fn test_malformed_pattern_fails_open() {
        let field = FieldDescriptor::new("code", FieldType::Text, "Code").with_pattern("([a-z", Some("nope"));
        assert_eq!(validate_field(&field, Some(&json!("anything"))), None);
    }

    #[test]
    fn test_lookahead_pattern_is_enforced() {
        use crate::domain::aggregates::{FormSchema, PatternPolicy};

        let field = FieldDescriptor::new("password", FieldType::Password, "Password")
            .with_pattern("^(?=.*[0-9]).{8,}$", Some("Password needs a digit"));
        assert_eq!(validate_field(&field, Some(&json!("abcdefgh"))).as_deref(), Some("Password needs a digit"));
        assert_eq!(validate_field(&field, Some(&json!("abcdefg1"))), None);

        let schema = FormSchema::new("signup", vec![field]);
        assert!(schema.check_definition(PatternPolicy::Lenient).is_empty());
        assert!(schema.check_definition(PatternPolicy::Strict).is_empty());
    }

    #[test]
    fn test_integral_float_uses_integer_string_form() {
        let field = FieldDescriptor::new("age", FieldType::Number, "Age").with_pattern("^[0-9]+$", None);
        assert_eq!(validate_field(&field, Some(&json!(45.0))), None);
        let parsed: Value = serde_json::from_str("45.0").unwrap();
        assert_eq!(validate_field(&field, Some(&parsed)), None);
        assert_eq!(validate_field(&field, Some(&json!(45.5))).as_deref(), Some("Invalid format"));
    }

    fn any_field_type() -> impl Strategy<Value = FieldType> {
        prop_oneof![
            Just(FieldType::Text),
            Just(FieldType::Email),
            Just(FieldType::Password),
            Just(FieldType::Date),
            Just(FieldType::Number),
            Just(FieldType::Dropdown),
        ]
    }

    fn empty_value() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![Just(None), Just(Some(Value::Null)), Just(Some(json!("")))]
    }

    proptest! {
        #[test]
        fn prop_required_empty_always_errors(
            field_type in any_field_type(),
            label in "[A-Za-z ]{1,20}",
            value in empty_value(),
        ) {
            let field = FieldDescriptor::new("f", field_type, label.clone())
                .required()
                .with_length(Some(3), Some(5))
                .with_range(Some(1.0), Some(2.0))
                .with_options(["x"])
                .with_pattern("^z$", Some("custom"));
            prop_assert_eq!(validate_field(&field, value.as_ref()), Some(format!("{label} is required")));
        }

        #[test]
        fn prop_optional_empty_always_passes(
            field_type in any_field_type(),
            value in empty_value(),
        ) {
            let field = FieldDescriptor::new("f", field_type, "F")
                .with_length(Some(3), Some(5))
                .with_range(Some(1.0), Some(2.0))
                .with_options(["x"])
                .with_pattern("^z$", None);
            prop_assert_eq!(validate_field(&field, value.as_ref()), None);
        }
    }
}
