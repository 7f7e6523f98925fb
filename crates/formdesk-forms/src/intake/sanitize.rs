use serde_json::Value;

use crate::domain::aggregates::SubmissionData;

/// Drop `null` values and trim top-level strings. Other values pass through.
pub fn sanitize(raw: &SubmissionData) -> SubmissionData {
    raw.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let cleaned = match value {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other.clone(),
            };
            (key.clone(), cleaned)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize() {
        let raw = json!({
            "name": "  Ada Lovelace ",
            "nickname": null,
            "age": 36,
            "tags": [" a ", "b"],
            "empty": "   "
        });
        let clean = sanitize(raw.as_object().unwrap());

        assert_eq!(
            Value::Object(clean),
            json!({
                "name": "Ada Lovelace",
                "age": 36,
                "tags": [" a ", "b"],
                "empty": ""
            })
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let raw = json!({ "a": " x ", "b": null, "c": false });
        let once = sanitize(raw.as_object().unwrap());
        assert_eq!(sanitize(&once), once);
    }
}
