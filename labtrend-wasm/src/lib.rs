//! Bridge WASM <-> JavaScript cho lớp giao diện, không phụ thuộc framework.

use chrono::NaiveDate;
use labtrend_core::{ParameterValue, SummaryConfig};
use labtrend_reports::{compute_summary, parse_report_value, parse_reports_value};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsSummaryConfig {
    #[serde(default)]
    recent_months: Option<u32>,
    #[serde(default)]
    stable_change_percent: Option<f64>,
    #[serde(default)]
    default_category: Option<String>,
    /// Mốc bắt đầu cửa sổ "gần đây", dạng YYYY-MM-DD.
    #[serde(default)]
    window_start: Option<NaiveDate>,
}

impl From<JsSummaryConfig> for SummaryConfig {
    fn from(cfg: JsSummaryConfig) -> Self {
        let mut base = SummaryConfig::default();
        if let Some(months) = cfg.recent_months {
            base.recent_months = months;
        }
        if let Some(percent) = cfg.stable_change_percent {
            base.stable_change_percent = percent;
        }
        if let Some(category) = cfg.default_category {
            base.default_category = category;
        }
        base
    }
}

/// Khoảng tham chiếu trả về JS; JSON không có vô cực nên tách cờ riêng.
#[derive(Serialize)]
struct JsRange {
    min: Option<f64>,
    max: Option<f64>,
    unbounded_above: bool,
}

#[wasm_bindgen(js_name = compute_summary)]
pub fn compute_summary_js(reports: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let (cfg, window_start) = read_config(config)?;
    let reports = read_reports(reports, &cfg)?;
    let summary = compute_summary(&reports, window_start, &cfg);

    to_value(&summary).map_err(|err| JsValue::from_str(&format!("Không serialize summary: {err}")))
}

#[wasm_bindgen]
pub fn trend_records(reports: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    let (cfg, _) = read_config(config)?;
    let reports = read_reports(reports, &cfg)?;

    to_value(&labtrend_reports::trend_records(&reports, &cfg))
        .map_err(|err| JsValue::from_str(&format!("Không serialize trend: {err}")))
}

#[wasm_bindgen]
pub fn canonical_parameters(report: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    let (cfg, _) = read_config(config)?;
    let report_value = from_value::<serde_json::Value>(report)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON báo cáo: {err}")))?;

    let parameters = labtrend_reports::canonical_parameters(&report_value, &cfg);
    to_value(&parameters)
        .map_err(|err| JsValue::from_str(&format!("Không serialize chỉ số: {err}")))
}

#[wasm_bindgen]
pub fn is_abnormal(value: JsValue, range: Option<String>) -> bool {
    let value = from_value::<Option<ParameterValue>>(value).ok().flatten();
    labtrend_reports::is_abnormal(value.as_ref(), range.as_deref())
}

#[wasm_bindgen]
pub fn parse_reference_range(text: &str) -> Result<JsValue, JsValue> {
    let range = labtrend_reports::parse_reference_range(text);
    let unbounded_above = range.max == Some(f64::INFINITY);
    let js_range = JsRange {
        min: range.min,
        max: range.max.filter(|max| max.is_finite()),
        unbounded_above,
    };
    to_value(&js_range).map_err(|err| JsValue::from_str(&format!("Không serialize khoảng: {err}")))
}

/// Đọc một báo cáo đơn lẻ, dùng khi UI chỉ có chi tiết một báo cáo.
#[wasm_bindgen]
pub fn decode_report(report: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    let (cfg, _) = read_config(config)?;
    let report_value = from_value::<serde_json::Value>(report)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON báo cáo: {err}")))?;
    let report = parse_report_value(&report_value, &cfg)
        .ok_or_else(|| JsValue::from_str("Báo cáo phải là một object"))?;
    to_value(&report).map_err(|err| JsValue::from_str(&format!("Không serialize báo cáo: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<(SummaryConfig, Option<NaiveDate>), JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsSummaryConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            let window_start = cfg.window_start;
            Ok((SummaryConfig::from(cfg), window_start))
        }
        _ => Ok((SummaryConfig::default(), None)),
    }
}

fn read_reports(
    reports: JsValue,
    cfg: &SummaryConfig,
) -> Result<Vec<labtrend_core::Report>, JsValue> {
    let reports_value = from_value::<serde_json::Value>(reports)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON báo cáo: {err}")))?;
    parse_reports_value(&reports_value, cfg)
        .map_err(|err| JsValue::from_str(&format!("Records error: {err}")))
}
