//! Human-readable formatting of submitted values for the review page

use chrono::format::{Item, StrftimeItems};
use chrono::DateTime;
use indexmap::IndexMap;
use serde_json::Value;

use crate::forms::schema::value_to_string;
use crate::forms::{FieldDefinition, FieldType, FormData, OptionSource};

/// Formatting settings for review labels
#[derive(Debug, Clone)]
pub struct LabelFormat {
    /// Joins the labels of multi-valued selections
    pub option_delimiter: String,
    /// chrono format string for timestamp fields
    pub date_format: String,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self {
            option_delimiter: ", ".to_string(),
            date_format: "%A, %-d %B %Y, %H:%M".to_string(),
        }
    }
}

const DURATION_UNITS: &[(i64, &str, &str)] = &[
    (604_800, "week", "weeks"),
    (86_400, "day", "days"),
    (3_600, "hour", "hours"),
    (60, "minute", "minutes"),
    (1, "second", "seconds"),
];

/// Decompose seconds into weeks, days, hours, minutes and seconds,
/// largest unit first, omitting zero units.
pub fn format_duration(total_seconds: i64) -> String {
    if total_seconds <= 0 {
        return "0 seconds".to_string();
    }

    let mut remaining = total_seconds;
    let mut parts = Vec::new();
    for (size, singular, plural) in DURATION_UNITS {
        let count = remaining / size;
        remaining %= size;
        if count > 0 {
            let unit = if count == 1 { singular } else { plural };
            parts.push(format!("{} {}", count, unit));
        }
    }
    parts.join(" ")
}

/// Whether `date_format` parses as a chrono strftime format
pub fn is_valid_date_format(date_format: &str) -> bool {
    !StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error))
}

/// Render a unix timestamp with the given chrono format (UTC).
/// Falls back to the raw timestamp when the format is invalid.
pub fn format_timestamp(timestamp: i64, date_format: &str) -> String {
    if !is_valid_date_format(date_format) {
        tracing::warn!(date_format, "Invalid date format, showing raw timestamp");
        return timestamp.to_string();
    }
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(date_format).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Format one submitted value for display
pub fn format_field_value(field: &FieldDefinition, value: Option<&Value>, format: &LabelFormat) -> String {
    if let Some(options) = field.options() {
        let raw: Vec<String> = match value {
            Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
            Some(Value::Null) | None if field.field_type.is_checkbox() => vec!["0".to_string()],
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![value_to_string(other)],
        };
        return raw
            .iter()
            .map(|v| options.get(v).cloned().unwrap_or_else(|| v.clone()))
            .collect::<Vec<_>>()
            .join(&format.option_delimiter);
    }

    let Some(value) = value else {
        return String::new();
    };

    match field.field_type {
        FieldType::Duration => as_integer(value)
            .map(format_duration)
            .unwrap_or_else(|| value_to_string(value)),
        FieldType::DateTime => as_integer(value)
            .map(|ts| format_timestamp(ts, &format.date_format))
            .unwrap_or_else(|| value_to_string(value)),
        _ => value_to_string(value),
    }
}

/// Build the label → display value mapping for every non-hidden field
pub fn build_labels(
    fields: &[FieldDefinition],
    values: &FormData,
    format: &LabelFormat,
) -> IndexMap<String, String> {
    fields
        .iter()
        .filter(|f| !f.is_hidden())
        .map(|f| {
            (
                f.label.clone(),
                format_field_value(f, values.get(&f.name), format),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FieldOption;
    use serde_json::json;

    #[test]
    fn test_format_duration_zero() {
        assert_eq!(format_duration(0), "0 seconds");
        assert_eq!(format_duration(-30), "0 seconds");
    }

    #[test]
    fn test_format_duration_hour_minute_second() {
        assert_eq!(format_duration(3661), "1 hour 1 minute 1 second");
    }

    #[test]
    fn test_format_duration_plurals_and_gaps() {
        // 2 weeks, 0 days, 3 hours, 0 minutes, 5 seconds
        let total = 2 * 604_800 + 3 * 3_600 + 5;
        assert_eq!(format_duration(total), "2 weeks 3 hours 5 seconds");
        assert_eq!(format_duration(86_400), "1 day");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0, "%Y-%m-%d"), "1970-01-01");
        assert_eq!(
            format_timestamp(1_700_000_000, &LabelFormat::default().date_format),
            "Tuesday, 14 November 2023, 22:13"
        );
    }

    #[test]
    fn test_invalid_date_format_falls_back_to_timestamp() {
        assert!(!is_valid_date_format("%Q"));
        assert!(is_valid_date_format("%Y-%m-%d %H:%M"));
        assert_eq!(format_timestamp(1_700_000_000, "%Q"), "1700000000");
    }

    #[test]
    fn test_select_maps_to_labels() {
        let field = FieldDefinition::new("color", "Color", FieldType::Select)
            .with_options(vec![FieldOption::new("r", "Red"), FieldOption::new("g", "Green")])
            .multiple();
        let format = LabelFormat::default();
        assert_eq!(format_field_value(&field, Some(&json!("r")), &format), "Red");
        assert_eq!(
            format_field_value(&field, Some(&json!(["r", "g"])), &format),
            "Red, Green"
        );
        assert_eq!(format_field_value(&field, Some(&json!("x")), &format), "x");
    }

    #[test]
    fn test_checkbox_unchecked_when_missing() {
        let field = FieldDefinition::new("agree", "Agree", FieldType::Checkbox);
        assert_eq!(format_field_value(&field, None, &LabelFormat::default()), "No");
        assert_eq!(
            format_field_value(&field, Some(&json!("1")), &LabelFormat::default()),
            "Yes"
        );
    }

    #[test]
    fn test_duration_field() {
        let field = FieldDefinition::new("wait", "Wait", FieldType::Duration);
        assert_eq!(
            format_field_value(&field, Some(&json!("3661")), &LabelFormat::default()),
            "1 hour 1 minute 1 second"
        );
    }

    #[test]
    fn test_build_labels_skips_hidden() {
        let fields = vec![
            FieldDefinition::new("uniqueid", "Unique id", FieldType::Hidden),
            FieldDefinition::new("name", "Name", FieldType::Text),
        ];
        let values = json!({"uniqueid": "abc", "name": "Ada"});
        let labels = build_labels(&fields, values.as_object().unwrap(), &LabelFormat::default());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("Name").map(String::as_str), Some("Ada"));
    }
}
