//! In-range / out-of-range classification of parameter values.

use labtrend_core::{NormalizedRange, Parameter, ParameterStatus, ParameterValue};

use crate::numeric::normalize_numeric;
use crate::range::parse_optional_range;

/// Whether `raw_value` lies strictly outside `raw_range`.
///
/// Unreadable values or ranges are never abnormal. Bounds are inclusive.
pub fn is_abnormal(raw_value: Option<&ParameterValue>, raw_range: Option<&str>) -> bool {
    let Some(value) = normalize_numeric(raw_value) else {
        return false;
    };
    status_for(value, &parse_optional_range(raw_range))
        .map(ParameterStatus::is_abnormal)
        .unwrap_or(false)
}

/// Low / normal / high, or `None` when the range has an open bound.
pub fn status_for(value: f64, range: &NormalizedRange) -> Option<ParameterStatus> {
    let (min, max) = range.bounds()?;
    Some(if value < min {
        ParameterStatus::Low
    } else if value > max {
        ParameterStatus::High
    } else {
        ParameterStatus::Normal
    })
}

/// Numeric value and status of a canonical parameter, when both resolve.
pub fn classify_parameter(parameter: &Parameter) -> Option<(f64, ParameterStatus)> {
    let value = normalize_numeric(parameter.value.as_ref())?;
    let status = status_for(value, &parse_optional_range(parameter.reference_range.as_deref()))?;
    Some((value, status))
}

/// A parameter counts toward the abnormal total only with both fields present.
pub fn parameter_is_abnormal(parameter: &Parameter) -> bool {
    match (&parameter.value, &parameter.reference_range) {
        (Some(value), Some(range)) => is_abnormal(Some(value), Some(range)),
        _ => false,
    }
}
