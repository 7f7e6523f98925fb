//! Terminal analytics dashboard
//!
//! Turns an [`AnalyticsSnapshot`] into ranked, percentage-annotated rows.

use std::cmp::Reverse;
use std::fmt::Write;

use chrono::NaiveDate;
use colored::Colorize;
use formdesk_forms::AnalyticsSnapshot;
use tabled::Tabled;

use crate::output::table;

const TOP_FIELDS: usize = 5;
const RECENT_DAYS: usize = 7;
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Submissions")]
    pub count: u64,
    #[tabled(rename = "Share", display_with = "percent")]
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct CategoryRow {
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Count")]
    pub count: u64,
    #[tabled(rename = "Share", display_with = "percent")]
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayRow {
    pub label: String,
    pub count: u64,
}

/// Presentation model for one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub total: u64,
    /// Rounded to whole years.
    pub average_age: Option<i64>,
    pub unique_fields: usize,
    pub categories: Vec<CategoryRow>,
    pub recent_days: Vec<DayRow>,
    pub top_fields: Vec<FieldRow>,
}

impl Dashboard {
    pub fn from_snapshot(snapshot: &AnalyticsSnapshot) -> Self {
        let total = snapshot.total_submissions;
        let categorized: u64 = snapshot.submissions_by_gender.values().sum();

        let mut categories: Vec<CategoryRow> = snapshot
            .submissions_by_gender
            .iter()
            .map(|(value, &count)| CategoryRow { value: value.clone(), count, percent: share(count, categorized) })
            .collect();
        categories.sort_by_key(|row| Reverse(row.count));

        let mut ranked: Vec<(&String, &u64)> = snapshot.top_form_fields.iter().collect();
        ranked.sort_by(|(a_name, a_count), (b_name, b_count)| b_count.cmp(a_count).then_with(|| a_name.cmp(b_name)));
        let top_fields = ranked
            .into_iter()
            .take(TOP_FIELDS)
            .map(|(name, &count)| FieldRow { field: capitalize(name), count, percent: share(count, total) })
            .collect();

        let skip = snapshot.submissions_by_date.len().saturating_sub(RECENT_DAYS);
        let recent_days = snapshot
            .submissions_by_date
            .iter()
            .skip(skip)
            .map(|(day, &count)| DayRow { label: day_label(day), count })
            .collect();

        Self {
            total,
            average_age: snapshot.average_age.map(|age| age.round() as i64),
            unique_fields: snapshot.top_form_fields.len(),
            categories,
            recent_days,
            top_fields,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// One-paragraph summary printed after a submit.
    pub fn summary(&self) -> String {
        let age = self.average_age.map_or_else(|| "N/A".to_string(), |age| format!("{age}"));
        format!(
            "{} submissions · average age {} · {} categories · {} unique fields",
            self.total,
            age,
            self.categories.len(),
            self.unique_fields
        )
    }

    pub fn render(&self) -> String {
        if self.is_empty() {
            return format!(
                "{}\nAnalytics will be available once form submissions are received.",
                "No analytics data".bold()
            );
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", "Overview".bold().underline());
        let _ = writeln!(out, "{}\n", self.summary());

        if !self.categories.is_empty() {
            let _ = writeln!(out, "{}", "Gender Distribution".bold());
            let _ = writeln!(out, "{}\n", table(self.categories.clone()));
        }

        if !self.recent_days.is_empty() {
            let _ = writeln!(out, "{}", "Submissions Over Time (Last 7 Days)".bold());
            let peak = self.recent_days.iter().map(|d| d.count).max().unwrap_or(0);
            for day in &self.recent_days {
                let _ = writeln!(out, "  {:>6}  {} {}", day.label, bar(day.count, peak).cyan(), day.count);
            }
            out.push('\n');
        }

        if !self.top_fields.is_empty() {
            let _ = writeln!(out, "{}", "Most Common Form Fields".bold());
            let _ = writeln!(out, "{}", table(self.top_fields.clone()));
        }
        out
    }
}

fn share(count: u64, of: u64) -> f64 {
    if of == 0 {
        0.0
    } else {
        count as f64 / of as f64 * 100.0
    }
}

fn percent(value: &f64) -> String {
    format!("{value:.0}%")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `Mar 5` for a `YYYY-MM-DD` key; other keys are shown as-is.
fn day_label(day: &str) -> String {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|date| date.format("%b %-d").to_string())
        .unwrap_or_else(|_| day.to_string())
}

fn bar(count: u64, peak: u64) -> String {
    if peak == 0 {
        return String::new();
    }
    let width = ((count as f64 / peak as f64) * BAR_WIDTH as f64).round().max(1.0) as usize;
    "█".repeat(width)
}
