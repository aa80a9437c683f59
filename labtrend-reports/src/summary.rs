//! Aggregate metrics and per-parameter trends across a report series.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate, Utc};
use labtrend_core::{
    ParameterStatus, Report, SummaryConfig, SummaryMetrics, Trend, TrendPoint, TrendRecord,
    TrendTally,
};

use crate::classify::{classify_parameter, parameter_is_abnormal};

/// Summary metrics evaluated against today's date.
///
/// `window_start` replaces the start of the "recent" window when given;
/// otherwise it is today minus [`SummaryConfig::recent_months`] calendar months.
pub fn compute_summary(
    reports: &[Report],
    window_start: Option<NaiveDate>,
    config: &SummaryConfig,
) -> SummaryMetrics {
    compute_summary_at(reports, window_start, Utc::now().date_naive(), config)
}

/// [`compute_summary`] with an explicit evaluation date.
pub fn compute_summary_at(
    reports: &[Report],
    window_start: Option<NaiveDate>,
    today: NaiveDate,
    config: &SummaryConfig,
) -> SummaryMetrics {
    let window_start = window_start.unwrap_or_else(|| months_before(today, config.recent_months));

    let recent_reports = reports
        .iter()
        .filter(|report| report.date.is_some_and(|date| date >= window_start))
        .count();

    let abnormal_values = reports
        .iter()
        .flat_map(|report| report.parameters.iter())
        .filter(|parameter| parameter_is_abnormal(parameter))
        .count();

    let mut trending_parameters = TrendTally::default();
    for trend in trend_records(reports, config)
        .into_iter()
        .filter_map(|record| record.trend)
    {
        trending_parameters.record(trend);
    }

    SummaryMetrics {
        total_reports: reports.len(),
        recent_reports,
        shared_reports: 0,
        abnormal_values,
        trending_parameters,
    }
}

/// Per-name observation series over all reports, oldest observation first.
///
/// Records are ordered by their latest observation, most recent first.
pub fn trend_records(reports: &[Report], config: &SummaryConfig) -> Vec<TrendRecord> {
    let mut ordered: Vec<&Report> = reports.iter().collect();
    ordered.sort_by_key(|report| report.date);

    let mut series: HashMap<String, TrendAccumulator> = HashMap::new();
    for report in ordered {
        for parameter in &report.parameters {
            let Some((value, status)) = classify_parameter(parameter) else {
                continue;
            };
            let point = TrendPoint {
                date: report.date,
                value,
                status,
            };
            series
                .entry(parameter.name.clone())
                .or_insert_with(TrendAccumulator::default)
                .push(point, parameter.unit.clone());
        }
    }

    let mut records: Vec<TrendRecord> = series
        .into_iter()
        .map(|(name, acc)| {
            let trend = match (acc.points.first(), acc.points.last()) {
                (Some(first), Some(last)) if acc.points.len() >= 2 => {
                    Some(classify_trend(first, last, config.stable_change_percent))
                }
                _ => None,
            };
            TrendRecord {
                name,
                unit: acc.unit,
                points: acc.points,
                trend,
            }
        })
        .collect();

    records.sort_by(|a, b| {
        let a_latest = a.points.last().and_then(|p| p.date);
        let b_latest = b.points.last().and_then(|p| p.date);
        b_latest.cmp(&a_latest).then_with(|| a.name.cmp(&b.name))
    });
    records
}

/// Compare only the first and last observation of a series.
pub fn classify_trend(first: &TrendPoint, last: &TrendPoint, stable_change_percent: f64) -> Trend {
    use ParameterStatus::{High, Low, Normal};

    match (first.status, last.status) {
        (High, Normal) | (Low, Normal) => Trend::Improving,
        (Normal, High) | (Normal, Low) => Trend::Worsening,
        (High | Low, High | Low) => {
            if percent_change(first.value, last.value) <= stable_change_percent {
                Trend::Stable
            } else if moved_toward_normal(first, last) {
                Trend::Improving
            } else {
                Trend::Worsening
            }
        }
        (Normal, Normal) => Trend::Stable,
    }
}

fn percent_change(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return if last == 0.0 { 0.0 } else { f64::INFINITY };
    }
    (last - first).abs() * 100.0 / first.abs()
}

fn moved_toward_normal(first: &TrendPoint, last: &TrendPoint) -> bool {
    match first.status {
        ParameterStatus::High => last.value < first.value,
        ParameterStatus::Low => last.value > first.value,
        ParameterStatus::Normal => false,
    }
}

/// Calendar month subtraction; a day past the target month's end rolls forward
/// (March 31 minus one month is March 3, or March 2 in a leap year).
///
/// Month counts reaching past the representable calendar give `NaiveDate::MIN`.
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) - i64::from(months);
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12));
    i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, month0 as u32 + 1, 1))
        .and_then(|first| first.checked_add_days(Days::new(u64::from(date.day0()))))
        .unwrap_or(NaiveDate::MIN)
}

#[derive(Default)]
struct TrendAccumulator {
    unit: Option<String>,
    points: Vec<TrendPoint>,
}

impl TrendAccumulator {
    fn push(&mut self, point: TrendPoint, unit: Option<String>) {
        // First unit seen wins so the chart stays on one scale.
        if self.unit.is_none() {
            self.unit = unit;
        }
        self.points.push(point);
    }
}
