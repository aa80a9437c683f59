use chrono::NaiveDate;
use labtrend_core::{Report, SummaryConfig, SummaryMetrics, TrendRecord};
use labtrend_reports::{compute_summary, trend_records};
use tracing::warn;

use crate::{ClientError, RecordsBackend, Session};

/// Everything the dashboard view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub reports: Vec<Report>,
    pub summary: SummaryMetrics,
    pub trends: Vec<TrendRecord>,
}

/// Compute the summary, then merge the shared-report count on a best-effort basis.
///
/// The synchronous fields never depend on the sharing service: if it fails the
/// error is logged and `shared_reports` stays 0.
pub async fn summarize_with_sharing<B: RecordsBackend>(
    backend: &B,
    session: &Session,
    reports: &[Report],
    window_start: Option<NaiveDate>,
    config: &SummaryConfig,
) -> SummaryMetrics {
    let summary = compute_summary(reports, window_start, config);

    match backend.shared_report_count(session).await {
        Ok(count) => summary.with_shared_reports(count),
        Err(err) => {
            warn!(error = %err, "shared report count unavailable, defaulting to 0");
            summary
        }
    }
}

/// Fetch the user's reports and derive the dashboard. Report fetch failures propagate.
pub async fn load_dashboard<B: RecordsBackend>(
    backend: &B,
    session: &Session,
    window_start: Option<NaiveDate>,
    config: &SummaryConfig,
) -> Result<Dashboard, ClientError> {
    let reports = backend.list_reports(session).await?;
    let summary = summarize_with_sharing(backend, session, &reports, window_start, config).await;
    let trends = trend_records(&reports, config);

    Ok(Dashboard {
        reports,
        summary,
        trends,
    })
}
