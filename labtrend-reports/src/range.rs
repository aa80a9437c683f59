//! Free-text reference range parsing.

use std::sync::LazyLock;

use labtrend_core::NormalizedRange;
use regex::Regex;

static RE_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*-\s*(\d+(?:\.\d+)?)").unwrap());
static RE_ABOVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)above\s+(\d+(?:\.\d+)?)").unwrap());
static RE_BELOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)below\s+(\d+(?:\.\d+)?)").unwrap());

/// Parse a reference range such as `"70-100"`, `"Above 40"` or `"Below 5.0"`.
///
/// Patterns are tried in that order and the first match wins. Anything else,
/// including an empty string, yields [`NormalizedRange::UNRESOLVED`].
pub fn parse_reference_range(text: &str) -> NormalizedRange {
    if text.is_empty() {
        return NormalizedRange::UNRESOLVED;
    }

    if let Some(caps) = RE_DASH.captures(text) {
        return match (capture_f64(&caps, 1), capture_f64(&caps, 2)) {
            (Some(min), Some(max)) => NormalizedRange::new(min, max),
            _ => NormalizedRange::UNRESOLVED,
        };
    }

    if let Some(caps) = RE_ABOVE.captures(text) {
        return capture_f64(&caps, 1)
            .map(|min| NormalizedRange::new(min, f64::INFINITY))
            .unwrap_or(NormalizedRange::UNRESOLVED);
    }

    if let Some(caps) = RE_BELOW.captures(text) {
        return capture_f64(&caps, 1)
            .map(|max| NormalizedRange::new(0.0, max))
            .unwrap_or(NormalizedRange::UNRESOLVED);
    }

    NormalizedRange::UNRESOLVED
}

/// Range for an optional string field; absent means unresolved.
pub fn parse_optional_range(text: Option<&str>) -> NormalizedRange {
    text.map(parse_reference_range)
        .unwrap_or(NormalizedRange::UNRESOLVED)
}

fn capture_f64(caps: &regex::Captures<'_>, index: usize) -> Option<f64> {
    caps.get(index)?.as_str().parse::<f64>().ok()
}
