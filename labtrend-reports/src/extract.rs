//! Decoding backend report JSON into canonical [`Report`]s.

use chrono::{DateTime, NaiveDate, Utc};
use labtrend_core::{Parameter, ParameterValue, RecordsError, Report, SummaryConfig};
use serde_json::{Map, Value};
use tracing::debug;

/// The two shapes a report's `extractedParameters` field arrives in.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedParameters<'a> {
    /// `[{name, value, unit, referenceRange, category}, ...]`
    List(&'a [Value]),
    /// `{category: {parameter name: {Value, Unit, Reference Range}}}`
    Nested(&'a Map<String, Value>),
}

impl<'a> ExtractedParameters<'a> {
    /// Decide the shape once, at the boundary. `None` for any other shape.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::List(items)),
            Value::Object(map) => Some(Self::Nested(map)),
            _ => None,
        }
    }

    /// Flatten into the canonical parameter list, preserving source order.
    pub fn canonicalize(&self, default_category: &str) -> Vec<Parameter> {
        match self {
            Self::List(items) => items
                .iter()
                .filter_map(|item| list_parameter(item, default_category))
                .collect(),
            Self::Nested(categories) => categories
                .iter()
                .flat_map(|(category, entries)| nested_category(category, entries))
                .collect(),
        }
    }
}

/// Canonical parameters of a raw report object. Never fails.
pub fn canonical_parameters(report: &Value, config: &SummaryConfig) -> Vec<Parameter> {
    report
        .get("extractedParameters")
        .and_then(ExtractedParameters::from_value)
        .map(|shape| shape.canonicalize(&config.default_category))
        .unwrap_or_default()
}

fn list_parameter(item: &Value, default_category: &str) -> Option<Parameter> {
    let Some(record) = item.as_object() else {
        debug!("skipping non-object parameter record");
        return None;
    };

    let category = record
        .get("category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_category.to_string());

    Some(Parameter {
        name: text_field(record, &["name"]).unwrap_or_default(),
        value: record.get("value").and_then(decode_value),
        unit: text_field(record, &["unit"]),
        reference_range: text_field(record, &["referenceRange"]),
        category,
    })
}

fn nested_category(category: &str, entries: &Value) -> Vec<Parameter> {
    let Some(entries) = entries.as_object() else {
        debug!(category, "skipping category that is not an object");
        return Vec::new();
    };

    entries
        .iter()
        .map(|(name, details)| nested_parameter(category, name, details))
        .collect()
}

fn nested_parameter(category: &str, name: &str, details: &Value) -> Parameter {
    let Some(details) = details.as_object() else {
        // Bare scalar: `{"Glucose": 95}`.
        return Parameter {
            name: name.to_string(),
            value: decode_value(details),
            unit: None,
            reference_range: None,
            category: category.to_string(),
        };
    };

    Parameter {
        name: name.to_string(),
        value: key_insensitive(details, &["Value", "value"]).and_then(decode_value),
        unit: key_insensitive(details, &["Unit", "unit"]).and_then(value_text),
        reference_range: key_insensitive(
            details,
            &["Reference Range", "referenceRange", "reference_range"],
        )
        .and_then(value_text),
        category: category.to_string(),
    }
}

/// Exact key first, in order; then any key equal ignoring ASCII case.
fn key_insensitive<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(value) = map.get(*key) {
            return Some(value);
        }
    }
    map.iter()
        .find(|(candidate, _)| keys.iter().any(|key| candidate.eq_ignore_ascii_case(key)))
        .map(|(_, value)| value)
}

fn decode_value(value: &Value) -> Option<ParameterValue> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

fn text_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(value_text)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Decode one backend report object. Non-objects yield `None`.
pub fn parse_report_value(report: &Value, config: &SummaryConfig) -> Option<Report> {
    let record = report.as_object()?;

    let report_id = ["reportId", "_id", "id"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(identifier_text)
        .unwrap_or_default();

    let date = ["date", "reportDate", "createdAt"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(value_date);

    Some(Report {
        report_id,
        user_id: record.get("userId").and_then(identifier_text),
        date,
        name: text_field(record, &["name"]),
        file_name: text_field(record, &["fileName"]),
        uploaded_at: ["uploadedAt", "createdAt"]
            .iter()
            .filter_map(|key| record.get(*key))
            .find_map(value_datetime),
        parameters: canonical_parameters(report, config),
        ai_analysis: record.get("aiAnalysis").filter(|value| !value.is_null()).cloned(),
        confidence_score: record
            .get("confidenceScore")
            .and_then(crate::numeric::normalize_json_numeric),
    })
}

/// Decode a report list: a bare array or an object wrapping one.
pub fn parse_reports_value(
    reports: &Value,
    config: &SummaryConfig,
) -> Result<Vec<Report>, RecordsError> {
    let items = report_items(reports).ok_or(RecordsError::MissingData)?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let parsed = parse_report_value(item, config);
            if parsed.is_none() {
                debug!("skipping report entry that is not an object");
            }
            parsed
        })
        .collect())
}

/// Decode a report list from a JSON string.
pub fn parse_reports_str(
    reports_json: &str,
    config: &SummaryConfig,
) -> Result<Vec<Report>, RecordsError> {
    let value: Value =
        serde_json::from_str(reports_json).map_err(|err| RecordsError::Parse(err.to_string()))?;
    parse_reports_value(&value, config)
}

/// The report array inside a payload, bare or wrapped under a known key.
pub fn report_items(payload: &Value) -> Option<&Vec<Value>> {
    if let Some(items) = payload.as_array() {
        return Some(items);
    }
    ["reports", "data", "sharedReports"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_array))
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn value_date(value: &Value) -> Option<NaiveDate> {
    if let Some(datetime) = value_datetime(value) {
        return Some(datetime.date_naive());
    }
    let text = value.as_str()?.trim();
    // Also covers timestamps without an offset, e.g. "2024-02-10T08:30:00".
    let day = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn value_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let text = match value {
        Value::String(text) => text.as_str(),
        // Extended JSON: {"$date": "..."}
        Value::Object(map) => map.get("$date").and_then(Value::as_str)?,
        _ => return None,
    };
    parse_datetime(text)
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(params: &[Parameter]) -> Vec<(String, Option<ParameterValue>, Option<String>, Option<String>)> {
        params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    p.value.clone(),
                    p.unit.clone(),
                    p.reference_range.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn list_shape_defaults_category() {
        let report = json!({
            "extractedParameters": [
                {"name": "Hemoglobin", "value": 13.5, "unit": "g/dL", "referenceRange": "12-16"},
                {"name": "WBC", "value": "7.2", "category": "CBC"}
            ]
        });
        let params = canonical_parameters(&report, &SummaryConfig::default());
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].category, "General");
        assert_eq!(params[1].category, "CBC");
        assert_eq!(params[1].value, Some(ParameterValue::Text("7.2".into())));
    }

    #[test]
    fn blank_list_category_uses_default() {
        let report = json!({
            "extractedParameters": [
                {"name": "Ferritin", "value": 80, "category": ""},
                {"name": "B12", "value": 400, "category": "   "}
            ]
        });
        let params = canonical_parameters(&report, &SummaryConfig::default());
        assert!(params.iter().all(|p| p.category == "General"));
    }

    #[test]
    fn both_shapes_describe_the_same_parameters() {
        let list = json!({
            "extractedParameters": [
                {"name": "Glucose", "value": 95, "unit": "mg/dL", "referenceRange": "70-100", "category": "Metabolic"},
                {"name": "HDL", "value": {"$numberDouble": "45.5"}, "unit": "mg/dL", "referenceRange": "Above 40", "category": "Lipids"}
            ]
        });
        let nested = json!({
            "extractedParameters": {
                "Metabolic": {"Glucose": {"Value": 95, "Unit": "mg/dL", "Reference Range": "70-100"}},
                "Lipids": {"HDL": {"value": {"$numberDouble": "45.5"}, "unit": "mg/dL", "referenceRange": "Above 40"}}
            }
        });

        let config = SummaryConfig::default();
        let from_list = canonical_parameters(&list, &config);
        let from_nested = canonical_parameters(&nested, &config);
        assert_eq!(content(&from_list), content(&from_nested));
        assert_eq!(from_nested[1].category, "Lipids");
    }

    #[test]
    fn nested_keys_match_ignoring_case() {
        let report = json!({
            "extractedParameters": {
                "Thyroid": {"TSH": {"VALUE": "2.1", "UNIT": "mIU/L", "REFERENCE RANGE": "0.4-4.0"}}
            }
        });
        let params = canonical_parameters(&report, &SummaryConfig::default());
        assert_eq!(params[0].value, Some(ParameterValue::Text("2.1".into())));
        assert_eq!(params[0].unit.as_deref(), Some("mIU/L"));
        assert_eq!(params[0].reference_range.as_deref(), Some("0.4-4.0"));
    }

    #[test]
    fn nested_scalar_details_become_values() {
        let report = json!({"extractedParameters": {"Misc": {"Glucose": 95}}});
        let params = canonical_parameters(&report, &SummaryConfig::default());
        assert_eq!(params[0].value, Some(ParameterValue::Number(95.0)));
        assert_eq!(params[0].reference_range, None);
    }

    #[test]
    fn missing_or_foreign_shapes_are_empty() {
        let config = SummaryConfig::default();
        assert!(canonical_parameters(&json!({}), &config).is_empty());
        assert!(canonical_parameters(&json!({"extractedParameters": "n/a"}), &config).is_empty());
        assert!(canonical_parameters(&json!({"extractedParameters": null}), &config).is_empty());
        assert!(canonical_parameters(&json!({"extractedParameters": [1, "x"]}), &config).is_empty());
    }

    #[test]
    fn report_fields_decode() {
        let report = json!({
            "_id": {"$oid": "65f0c0ffee"},
            "userId": "u-1",
            "date": "2024-02-10T08:30:00.000Z",
            "fileName": "panel.pdf",
            "confidenceScore": {"$numberDouble": "0.92"},
            "extractedParameters": []
        });
        let parsed = parse_report_value(&report, &SummaryConfig::default()).unwrap();
        assert_eq!(parsed.report_id, "65f0c0ffee");
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(parsed.confidence_score, Some(0.92));
        assert_eq!(parsed.display_name(), "panel.pdf");

        let plain_date = json!({"reportId": "r2", "date": "2024-02-11"});
        let parsed = parse_report_value(&plain_date, &SummaryConfig::default()).unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2024, 2, 11));
        assert!(parsed.parameters.is_empty());

        let local_time = json!({"reportId": "r3", "reportDate": "2024-02-12T09:00:00"});
        let parsed = parse_report_value(&local_time, &SummaryConfig::default()).unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2024, 2, 12));
    }

    #[test]
    fn report_lists_accept_wrappers() {
        let config = SummaryConfig::default();
        let wrapped = json!({"reports": [{"reportId": "a"}, 7, {"reportId": "b"}]});
        let reports = parse_reports_value(&wrapped, &config).unwrap();
        assert_eq!(reports.len(), 2);

        assert!(matches!(
            parse_reports_value(&json!({"oops": true}), &config),
            Err(RecordsError::MissingData)
        ));
        assert!(matches!(
            parse_reports_str("{not json", &config),
            Err(RecordsError::Parse(_))
        ));
    }
}
