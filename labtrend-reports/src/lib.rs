//! Lab report JSON to `SummaryMetrics` converter with trend analytics.

mod classify;
mod extract;
mod numeric;
mod range;
mod summary;

use chrono::NaiveDate;
use labtrend_core::{RecordsError, SummaryConfig, SummaryMetrics};
use serde_json::Value;

pub use classify::{classify_parameter, is_abnormal, parameter_is_abnormal, status_for};
pub use extract::{
    canonical_parameters, parse_report_value, parse_reports_str, parse_reports_value,
    report_items, ExtractedParameters,
};
pub use numeric::{normalize_json_numeric, normalize_numeric, parse_loose_number};
pub use range::{parse_optional_range, parse_reference_range};
pub use summary::{
    classify_trend, compute_summary, compute_summary_at, months_before, trend_records,
};

/// Summarize a report list from a JSON string.
pub fn summarize_reports_str(
    reports_json: &str,
    window_start: Option<NaiveDate>,
    config: &SummaryConfig,
) -> Result<SummaryMetrics, RecordsError> {
    let value: Value =
        serde_json::from_str(reports_json).map_err(|err| RecordsError::Parse(err.to_string()))?;
    summarize_reports_value(&value, window_start, config)
}

/// Summarize a report list from a `serde_json::Value`.
pub fn summarize_reports_value(
    reports: &Value,
    window_start: Option<NaiveDate>,
    config: &SummaryConfig,
) -> Result<SummaryMetrics, RecordsError> {
    let reports = parse_reports_value(reports, config)?;
    Ok(compute_summary(&reports, window_start, config))
}
