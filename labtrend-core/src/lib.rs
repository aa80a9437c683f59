//! Mô hình dữ liệu lõi cho báo cáo xét nghiệm và các chỉ số tổng hợp.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Nhóm mặc định khi chỉ số không khai báo `category`.
pub const DEFAULT_CATEGORY: &str = "General";

/// Cấu hình cho phép tính tổng hợp và xu hướng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryConfig {
    /// Số tháng lịch tính là "gần đây" khi không truyền mốc bắt đầu.
    pub recent_months: u32,
    /// Ngưỡng phần trăm thay đổi coi là ổn định khi cả hai đầu đều bất thường.
    pub stable_change_percent: f64,
    /// Nhóm gán cho chỉ số thiếu `category`.
    pub default_category: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            recent_months: 1,
            stable_change_percent: 10.0,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Giá trị số bọc theo định dạng extended JSON của cơ sở dữ liệu tài liệu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TaggedNumber {
    #[serde(rename = "$numberDouble")]
    Double(NumericLiteral),
    #[serde(rename = "$numberInt")]
    Int(NumericLiteral),
    #[serde(rename = "$numberLong")]
    Long(NumericLiteral),
}

/// Nội dung bên trong wrapper: thường là chuỗi, đôi khi là số.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumericLiteral {
    Number(f64),
    Text(String),
}

/// Giá trị thô của một chỉ số sau khi giải mã ở biên hệ thống.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
    Tagged(TaggedNumber),
    /// Mọi dạng khác (bool, mảng, wrapper lạ...). Không bao giờ chuẩn hoá được.
    Other(serde_json::Value),
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Một chỉ số xét nghiệm đã được đưa về dạng chuẩn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub value: Option<ParameterValue>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
    pub category: String,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            value: None,
            unit: None,
            reference_range: None,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Một báo cáo xét nghiệm đã tải lên.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Ngày của kết quả xét nghiệm, khác với thời điểm tải lên.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub ai_analysis: Option<serde_json::Value>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl Report {
    /// Nhãn hiển thị, rơi về tên tệp rồi tới nhãn sinh tự động.
    pub fn display_name(&self) -> String {
        let pick = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        pick(&self.name)
            .or_else(|| pick(&self.file_name))
            .unwrap_or_else(|| match self.date {
                Some(date) => format!("Lab report {date}"),
                None => "Lab report".to_string(),
            })
    }
}

/// Khoảng tham chiếu dạng số. Cả hai cận `None` nghĩa là không đọc được.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NormalizedRange {
    pub const UNRESOLVED: Self = Self {
        min: None,
        max: None,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Khoảng chỉ dùng được khi đủ cả hai cận.
    pub fn is_resolved(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        Some((self.min?, self.max?))
    }
}

/// Vị trí của giá trị so với khoảng tham chiếu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParameterStatus {
    Low,
    Normal,
    High,
}

impl ParameterStatus {
    pub fn is_abnormal(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Phân loại xu hướng giữa lần đo đầu và cuối.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

/// Một lần đo trong chuỗi xu hướng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub date: Option<NaiveDate>,
    pub value: f64,
    pub status: ParameterStatus,
}

/// Chuỗi đo theo thời gian của một chỉ số, tính lại ở mỗi lần tổng hợp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrendRecord {
    pub name: String,
    pub unit: Option<String>,
    pub points: Vec<TrendPoint>,
    /// `None` khi chưa đủ hai lần đo.
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TrendTally {
    pub improving: usize,
    pub worsening: usize,
    pub stable: usize,
}

impl TrendTally {
    pub fn record(&mut self, trend: Trend) {
        match trend {
            Trend::Improving => self.improving += 1,
            Trend::Worsening => self.worsening += 1,
            Trend::Stable => self.stable += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.improving + self.worsening + self.stable
    }
}

/// Kết quả tổng hợp cho bảng điều khiển.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_reports: usize,
    pub recent_reports: usize,
    /// Điền sau, từ dịch vụ chia sẻ; mặc định 0.
    pub shared_reports: usize,
    pub abnormal_values: usize,
    pub trending_parameters: TrendTally,
}

impl SummaryMetrics {
    /// Gắn số báo cáo được chia sẻ sau khi phần tính đồng bộ đã xong.
    pub fn with_shared_reports(mut self, shared_reports: usize) -> Self {
        self.shared_reports = shared_reports;
        self
    }
}

/// Lỗi chung khi đọc danh sách báo cáo.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Lỗi khác: {0}")]
    Other(String),
}
