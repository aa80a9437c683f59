use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use labtrend_core::{Report, SummaryConfig};
use labtrend_reports::{normalize_json_numeric, parse_report_value, parse_reports_value};
use reqwest::header::AUTHORIZATION;
use reqwest::{multipart, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::{ClientConfig, ClientError, Session};

/// The backend calls the summary layer depends on (allows faking in tests).
pub trait RecordsBackend {
    fn list_reports(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<Report>, ClientError>> + Send;

    fn shared_report_count(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<usize, ClientError>> + Send;
}

/// Signed-in user as returned by the session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(alias = "_id", alias = "userId")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Records backend over HTTP. Every call carries the session's bearer token.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    summary_config: SummaryConfig,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            summary_config: SummaryConfig::default(),
        })
    }

    /// Config used when decoding report payloads (default category...).
    pub fn with_summary_config(mut self, summary_config: SummaryConfig) -> Self {
        self.summary_config = summary_config;
        self
    }

    pub async fn current_user(&self, session: &Session) -> Result<UserProfile, ClientError> {
        let payload = self.send(self.client.get(self.url("/auth/me")), session).await?;
        let user = payload.get("user").cloned().unwrap_or(payload);
        serde_json::from_value(user).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn report(&self, session: &Session, report_id: &str) -> Result<Report, ClientError> {
        let url = self.url(&format!("/reports/{report_id}"));
        let payload = self.send(self.client.get(url), session).await?;
        self.decode_report(&payload)
    }

    pub async fn upload_report(
        &self,
        session: &Session,
        file_name: &str,
        contents: Vec<u8>,
        date: Option<NaiveDate>,
    ) -> Result<Report, ClientError> {
        let part = multipart::Part::bytes(contents).file_name(file_name.to_string());
        let mut form = multipart::Form::new().part("file", part);
        if let Some(date) = date {
            form = form.text("date", date.to_string());
        }

        let request = self.client.post(self.url("/reports/upload")).multipart(form);
        let payload = self.send(request, session).await?;
        self.decode_report(&payload)
    }

    pub async fn share_report(
        &self,
        session: &Session,
        report_id: &str,
        recipient_email: &str,
    ) -> Result<Value, ClientError> {
        let url = self.url(&format!("/reports/{report_id}/share"));
        let request = self.client.post(url).json(&json!({ "email": recipient_email }));
        self.send(request, session).await
    }

    /// Reports other users have shared with the session's user.
    pub async fn shared_reports(&self, session: &Session) -> Result<Vec<Report>, ClientError> {
        let payload = self.send(self.client.get(self.url("/reports/shared")), session).await?;
        Ok(parse_reports_value(&payload, &self.summary_config)?)
    }

    /// Natural-language search; the backend decides the result shape.
    pub async fn search(&self, session: &Session, query: &str) -> Result<Value, ClientError> {
        let request = self
            .client
            .post(self.url("/search"))
            .json(&json!({ "query": query }));
        self.send(request, session).await
    }

    pub async fn analysis(&self, session: &Session, report_id: &str) -> Result<Value, ClientError> {
        let url = self.url(&format!("/reports/{report_id}/analysis"));
        self.send(self.client.get(url), session).await
    }

    pub async fn confidence_score(
        &self,
        session: &Session,
        report_id: &str,
    ) -> Result<Option<f64>, ClientError> {
        let url = self.url(&format!("/reports/{report_id}/confidence"));
        let payload = self.send(self.client.get(url), session).await?;
        Ok(["confidenceScore", "score"]
            .iter()
            .filter_map(|key| payload.get(*key))
            .find_map(normalize_json_numeric)
            .or_else(|| normalize_json_numeric(&payload)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn decode_report(&self, payload: &Value) -> Result<Report, ClientError> {
        let report = payload.get("report").unwrap_or(payload);
        parse_report_value(report, &self.summary_config)
            .ok_or_else(|| ClientError::Decode("expected a report object".to_string()))
    }

    async fn send(&self, request: RequestBuilder, session: &Session) -> Result<Value, ClientError> {
        let response = request
            .header(AUTHORIZATION, session.authorization())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ClientError::Connection(self.base_url.clone())
                } else {
                    ClientError::Http(e.to_string())
                }
            })?;
        read_json(response).await
    }
}

impl RecordsBackend for HttpBackend {
    async fn list_reports(&self, session: &Session) -> Result<Vec<Report>, ClientError> {
        let payload = self.send(self.client.get(self.url("/reports")), session).await?;
        let reports = parse_reports_value(&payload, &self.summary_config)?;
        debug!(count = reports.len(), "fetched reports");
        Ok(reports)
    }

    async fn shared_report_count(&self, session: &Session) -> Result<usize, ClientError> {
        Ok(self.shared_reports(session).await?.len())
    }
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ClientError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}
