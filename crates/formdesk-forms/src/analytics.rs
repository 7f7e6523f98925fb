//! Analytics snapshots
//!
//! A snapshot is always recomputed from the full submission set. Every map is
//! a `BTreeMap` so the serialized snapshot does not depend on input order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::domain::aggregates::{Submission, SubmissionData};

/// Which record keys feed the category and numeric statistics.
///
/// Keys are tried in order; the first one holding a non-empty value wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub category_keys: Vec<String>,
    pub numeric_keys: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            category_keys: vec!["gender".into(), "Gender".into()],
            numeric_keys: vec!["age".into(), "Age".into()],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_submissions: u64,
    pub submissions_by_gender: BTreeMap<String, u64>,
    /// Absent when no submission carries a numeric age.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_age: Option<f64>,
    /// `YYYY-MM-DD` (UTC) to count.
    pub submissions_by_date: BTreeMap<String, u64>,
    /// Field name to the number of submissions containing it. Unranked.
    pub top_form_fields: BTreeMap<String, u64>,
}

#[derive(Clone, Debug, Default)]
pub struct AnalyticsAggregator {
    config: AnalyticsConfig,
}

impl AnalyticsAggregator {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn compute(&self, submissions: &[Submission]) -> AnalyticsSnapshot {
        let mut snapshot = AnalyticsSnapshot {
            total_submissions: submissions.len() as u64,
            ..Default::default()
        };
        let mut ages = Vec::new();

        for submission in submissions {
            if let Some(Value::String(category)) = first_present(&submission.data, &self.config.category_keys) {
                *snapshot.submissions_by_gender.entry(category.clone()).or_default() += 1;
            }

            if let Some(age) = first_present(&submission.data, &self.config.numeric_keys).and_then(coerce::number) {
                ages.push(age);
            }

            let day = submission.created_at.format("%Y-%m-%d").to_string();
            *snapshot.submissions_by_date.entry(day).or_default() += 1;

            for key in submission.data.keys() {
                *snapshot.top_form_fields.entry(key.clone()).or_default() += 1;
            }
        }

        snapshot.average_age = mean(&mut ages);
        snapshot
    }
}

fn first_present<'a>(data: &'a SubmissionData, keys: &[String]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| data.get(key))
        .find(|value| !coerce::is_empty(Some(value)))
}

/// Sorted before summing so the float result is independent of input order.
fn mean(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn submission(value: Value) -> Submission {
        Submission::create(value.as_object().cloned().unwrap())
    }

    fn on_day(value: Value, day: u32, hour: u32) -> Submission {
        let mut s = submission(value);
        s.created_at = Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap();
        s.updated_at = s.created_at;
        s
    }

    #[test]
    fn test_category_key_casing() {
        let snapshot = AnalyticsAggregator::default()
            .compute(&[submission(json!({ "gender": "Male" })), submission(json!({ "Gender": "Female" }))]);

        let expected: BTreeMap<String, u64> = [("Female".to_string(), 1), ("Male".to_string(), 1)].into();
        assert_eq!(snapshot.submissions_by_gender, expected);
        assert_eq!(snapshot.total_submissions, 2);
    }

    #[test]
    fn test_first_present_key_wins() {
        let snapshot = AnalyticsAggregator::default().compute(&[
            submission(json!({ "gender": "Other", "Gender": "Male" })),
            submission(json!({ "gender": "", "Gender": "Female" })),
            submission(json!({ "gender": 3 })),
            submission(json!({ "name": "no category" })),
        ]);

        assert_eq!(snapshot.submissions_by_gender.len(), 2);
        assert_eq!(snapshot.submissions_by_gender["Other"], 1);
        assert_eq!(snapshot.submissions_by_gender["Female"], 1);
    }

    #[test]
    fn test_average_age_skips_non_numeric() {
        let snapshot = AnalyticsAggregator::default().compute(&[
            submission(json!({ "age": 20 })),
            submission(json!({ "Age": "30" })),
            submission(json!({ "age": "unknown" })),
            submission(json!({ "name": "x" })),
        ]);
        assert_eq!(snapshot.average_age, Some(25.0));

        let none = AnalyticsAggregator::default().compute(&[submission(json!({ "age": "n/a" }))]);
        assert_eq!(none.average_age, None);
        assert!(serde_json::to_value(&none).unwrap().get("averageAge").is_none());
    }

    #[test]
    fn test_same_day_single_bucket() {
        let snapshot = AnalyticsAggregator::default().compute(&[
            on_day(json!({ "a": 1 }), 5, 0),
            on_day(json!({ "a": 2 }), 5, 12),
            on_day(json!({ "a": 3 }), 5, 23),
        ]);
        assert_eq!(snapshot.submissions_by_date.len(), 1);
        assert_eq!(snapshot.submissions_by_date["2024-03-05"], 3);
    }

    #[test]
    fn test_field_frequency() {
        let snapshot = AnalyticsAggregator::default().compute(&[
            submission(json!({ "email": "a@b.co", "name": "A" })),
            submission(json!({ "email": "c@d.co" })),
        ]);
        assert_eq!(snapshot.top_form_fields["email"], 2);
        assert_eq!(snapshot.top_form_fields["name"], 1);
    }

    #[test]
    fn test_configured_keys() {
        let aggregator = AnalyticsAggregator::new(AnalyticsConfig {
            category_keys: vec!["plan".into()],
            numeric_keys: vec!["seats".into()],
        });
        let snapshot = aggregator.compute(&[
            submission(json!({ "plan": "pro", "seats": 4, "gender": "Male" })),
            submission(json!({ "plan": "free", "seats": 2 })),
        ]);
        assert_eq!(snapshot.submissions_by_gender.len(), 2);
        assert!(!snapshot.submissions_by_gender.contains_key("Male"));
        assert_eq!(snapshot.average_age, Some(3.0));
    }

    #[test]
    fn test_empty_set() {
        let snapshot = AnalyticsAggregator::default().compute(&[]);
        assert_eq!(snapshot, AnalyticsSnapshot::default());
    }

    proptest! {
        #[test]
        fn prop_order_independent(
            ages in proptest::collection::vec(0.0f64..130.0, 0..20),
            genders in proptest::collection::vec("[A-Z][a-z]{0,6}", 0..20),
        ) {
            let mut submissions: Vec<Submission> = ages
                .iter()
                .zip(genders.iter().cycle().chain(std::iter::repeat(&String::new())))
                .enumerate()
                .map(|(i, (age, gender))| on_day(json!({ "age": age, "gender": gender }), 1 + (i % 28) as u32, 0))
                .collect();

            let aggregator = AnalyticsAggregator::default();
            let forward = serde_json::to_string(&aggregator.compute(&submissions)).unwrap();
            prop_assert_eq!(&forward, &serde_json::to_string(&aggregator.compute(&submissions)).unwrap());

            submissions.reverse();
            let reversed = serde_json::to_string(&aggregator.compute(&submissions)).unwrap();
            prop_assert_eq!(forward, reversed);
        }
    }
}
