use chrono::NaiveDate;
use labtrend_client::{load_dashboard, summarize_with_sharing, ClientError, RecordsBackend, Session};
use labtrend_core::{Parameter, ParameterValue, Report, SummaryConfig};

struct FakeBackend {
    reports: Option<Vec<Report>>,
    shared: Option<usize>,
}

impl RecordsBackend for FakeBackend {
    async fn list_reports(&self, _session: &Session) -> Result<Vec<Report>, ClientError> {
        self.reports.clone().ok_or(ClientError::Unauthorized)
    }

    async fn shared_report_count(&self, _session: &Session) -> Result<usize, ClientError> {
        self.shared.ok_or_else(|| ClientError::Status {
            status: 503,
            body: "sharing service down".to_string(),
        })
    }
}

fn glucose_reports() -> Vec<Report> {
    let report = |id: &str, day: u32, value: f64| Report {
        report_id: id.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, day),
        parameters: vec![Parameter {
            name: "Glucose".to_string(),
            value: Some(ParameterValue::Number(value)),
            reference_range: Some("70-100".to_string()),
            ..Parameter::default()
        }],
        ..Report::default()
    };
    vec![report("a", 5, 130.0), report("b", 20, 90.0)]
}

fn window() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 1, 1)
}

#[tokio::test]
async fn shared_count_is_merged_when_available() {
    let backend = FakeBackend {
        reports: Some(glucose_reports()),
        shared: Some(4),
    };
    let session = Session::new("token");
    let summary = summarize_with_sharing(
        &backend,
        &session,
        &glucose_reports(),
        window(),
        &SummaryConfig::default(),
    )
    .await;

    assert_eq!(summary.shared_reports, 4);
    assert_eq!(summary.total_reports, 2);
    assert_eq!(summary.trending_parameters.improving, 1);
}

#[tokio::test]
async fn sharing_failure_leaves_other_fields_intact() {
    let session = Session::new("token");
    let config = SummaryConfig::default();
    let healthy = FakeBackend {
        reports: None,
        shared: Some(0),
    };
    let failing = FakeBackend {
        reports: None,
        shared: None,
    };

    let expected =
        summarize_with_sharing(&healthy, &session, &glucose_reports(), window(), &config).await;
    let degraded =
        summarize_with_sharing(&failing, &session, &glucose_reports(), window(), &config).await;

    assert_eq!(degraded, expected);
    assert_eq!(degraded.shared_reports, 0);
    assert_eq!(degraded.abnormal_values, 1);
}

#[tokio::test]
async fn dashboard_propagates_report_fetch_failure() {
    let backend = FakeBackend {
        reports: None,
        shared: Some(1),
    };
    let result = load_dashboard(&backend, &Session::new("t"), window(), &SummaryConfig::default()).await;

    match result {
        Err(err) => assert!(err.requires_login()),
        Ok(_) => panic!("expected the report fetch error to propagate"),
    }
}

#[tokio::test]
async fn dashboard_carries_trends_and_summary() {
    let backend = FakeBackend {
        reports: Some(glucose_reports()),
        shared: None,
    };
    let dashboard = load_dashboard(&backend, &Session::new("t"), window(), &SummaryConfig::default())
        .await
        .expect("dashboard should load");

    assert_eq!(dashboard.reports.len(), 2);
    assert_eq!(dashboard.summary.shared_reports, 0);
    assert_eq!(dashboard.trends.len(), 1);
    assert_eq!(dashboard.trends[0].points.len(), 2);
}
