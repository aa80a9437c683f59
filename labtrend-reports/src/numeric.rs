//! Numeric normalization of raw parameter values.

use labtrend_core::{NumericLiteral, ParameterValue, TaggedNumber};
use serde_json::Value;

/// Convert a raw parameter value into a plain number.
///
/// Returns `None` whenever no valid number can be recovered; this never fails.
pub fn normalize_numeric(raw: Option<&ParameterValue>) -> Option<f64> {
    match raw? {
        ParameterValue::Number(number) => Some(*number),
        ParameterValue::Text(text) => parse_loose_number(text),
        ParameterValue::Tagged(tagged) => unwrap_tagged(tagged),
        ParameterValue::Other(_) => None,
    }
}

/// Same as [`normalize_numeric`] for an undecoded JSON value.
pub fn normalize_json_numeric(raw: &Value) -> Option<f64> {
    if raw.is_null() {
        return None;
    }
    let decoded: ParameterValue = serde_json::from_value(raw.clone()).ok()?;
    normalize_numeric(Some(&decoded))
}

fn unwrap_tagged(tagged: &TaggedNumber) -> Option<f64> {
    match tagged {
        TaggedNumber::Double(literal) => match literal {
            NumericLiteral::Number(number) => Some(*number),
            NumericLiteral::Text(text) => text.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        },
        TaggedNumber::Int(literal) | TaggedNumber::Long(literal) => match literal {
            NumericLiteral::Number(number) => Some(*number),
            NumericLiteral::Text(text) => whole_number(text),
        },
    }
}

/// Integer wrapper text; `"42"` and `"42.0"` both read, `"4.5"` does not.
fn whole_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value as f64);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
}

/// Keep digits, dots and a leading minus, then read the longest numeric prefix.
///
/// `"12.5 mg/dL"` reads as `12.5`, `"<5"` as `5`, `"abc"` as `None`.
pub fn parse_loose_number(text: &str) -> Option<f64> {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_digit() || ch == '.' || (ch == '-' && cleaned.is_empty()) {
            cleaned.push(ch);
        }
    }

    let prefix = numeric_prefix(&cleaned);
    if prefix.is_empty() {
        return None;
    }
    prefix.parse::<f64>().ok()
}

fn numeric_prefix(cleaned: &str) -> &str {
    let bytes = cleaned.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        ""
    } else {
        &cleaned[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn text(value: &str) -> ParameterValue {
        ParameterValue::Text(value.to_string())
    }

    #[test]
    fn strings_with_units_are_stripped() {
        assert_eq!(normalize_numeric(Some(&text("12.5 mg/dL"))), Some(12.5));
        assert_eq!(normalize_numeric(Some(&text("<5"))), Some(5.0));
        assert_eq!(normalize_numeric(Some(&text("-3.2"))), Some(-3.2));
        assert_eq!(normalize_numeric(Some(&text("1,200"))), Some(1200.0));
        assert_eq!(normalize_numeric(Some(&text("14."))), Some(14.0));
        assert_eq!(normalize_numeric(Some(&text(".5"))), Some(0.5));
    }

    #[test]
    fn strings_without_digits_are_none() {
        assert_eq!(normalize_numeric(Some(&text("abc"))), None);
        assert_eq!(normalize_numeric(Some(&text(""))), None);
        assert_eq!(normalize_numeric(Some(&text("-"))), None);
        assert_eq!(normalize_numeric(Some(&text("."))), None);
    }

    #[test]
    fn inner_minus_is_dropped() {
        assert_eq!(normalize_numeric(Some(&text("10-20"))), Some(1020.0));
    }

    #[test]
    fn each_wrapper_tag_unwraps() {
        assert_eq!(normalize_json_numeric(&json!({"$numberDouble": "5.25"})), Some(5.25));
        assert_eq!(normalize_json_numeric(&json!({"$numberInt": "42"})), Some(42.0));
        assert_eq!(
            normalize_json_numeric(&json!({"$numberLong": "9000000000"})),
            Some(9_000_000_000.0)
        );
        assert_eq!(normalize_json_numeric(&json!({"$numberDouble": 7.5})), Some(7.5));
        assert_eq!(normalize_json_numeric(&json!({"$numberInt": "42.0"})), Some(42.0));
        assert_eq!(normalize_json_numeric(&json!({"$numberLong": " -7 "})), Some(-7.0));
    }

    #[test]
    fn unknown_or_broken_wrappers_are_none() {
        assert_eq!(normalize_json_numeric(&json!({"$numberDecimal": "1.5"})), None);
        assert_eq!(normalize_json_numeric(&json!({"$numberInt": "4.5"})), None);
        assert_eq!(normalize_json_numeric(&json!({"$numberDouble": "NaN"})), None);
        assert_eq!(normalize_json_numeric(&json!({"$numberLong": "inf"})), None);
    }

    #[test]
    fn absent_and_foreign_types_are_none() {
        assert_eq!(normalize_numeric(None), None);
        assert_eq!(normalize_json_numeric(&Value::Null), None);
        assert_eq!(normalize_json_numeric(&json!(true)), None);
        assert_eq!(normalize_json_numeric(&json!([1, 2])), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn finite_numbers_pass_through(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            prop_assert_eq!(normalize_numeric(Some(&ParameterValue::Number(value))), Some(value));
        }

        #[test]
        fn arbitrary_text_never_panics(input in ".*") {
            let _ = parse_loose_number(&input);
        }
    }
}
