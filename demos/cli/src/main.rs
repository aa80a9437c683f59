use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use labtrend_client::{
    load_dashboard, ClientConfig, HttpBackend, Session, API_URL_ENV, TOKEN_ENV,
};
use labtrend_core::{ParameterValue, Report, SummaryConfig, SummaryMetrics, TrendRecord};
use labtrend_reports::{
    compute_summary, is_abnormal, parameter_is_abnormal, parse_reports_str, trend_records,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "labtrend-cli",
    about = "Tóm tắt báo cáo xét nghiệm và xu hướng chỉ số từ JSON hoặc từ backend."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Số liệu tổng hợp từ file JSON danh sách báo cáo.
    Summary {
        /// Đường dẫn tới file JSON.
        #[arg(short, long)]
        input: PathBuf,
        /// Mốc bắt đầu cửa sổ "gần đây" (YYYY-MM-DD).
        #[arg(long)]
        window_start: Option<NaiveDate>,
        /// In kết quả dạng JSON.
        #[arg(long)]
        json: bool,
    },
    /// Liệt kê chỉ số đã chuẩn hoá của từng báo cáo.
    Params {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Chuỗi xu hướng theo từng chỉ số.
    Trends {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Kiểm tra một giá trị với khoảng tham chiếu.
    Check {
        #[arg(long)]
        value: String,
        #[arg(long)]
        range: String,
    },
    /// Lấy báo cáo từ backend và tính bảng điều khiển.
    Fetch {
        #[arg(long, env = API_URL_ENV)]
        base_url: Option<String>,
        /// Token phiên; nếu bỏ trống sẽ đọc biến môi trường LABTREND_TOKEN.
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        window_start: Option<NaiveDate>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labtrend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = SummaryConfig::default();

    match args.command {
        Command::Summary {
            input,
            window_start,
            json,
        } => {
            let reports = read_reports(&input, &config)?;
            let summary = compute_summary(&reports, window_start, &config);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Command::Params { input } => {
            for report in read_reports(&input, &config)? {
                print_parameters(&report);
            }
        }
        Command::Trends { input } => {
            let reports = read_reports(&input, &config)?;
            for record in trend_records(&reports, &config) {
                print_trend(&record);
            }
        }
        Command::Check { value, range } => {
            let value = ParameterValue::Text(value);
            let abnormal = is_abnormal(Some(&value), Some(range.as_str()));
            println!("{}", if abnormal { "abnormal" } else { "within range" });
        }
        Command::Fetch {
            base_url,
            token,
            window_start,
        } => {
            let session = Session::resolve(token)
                .with_context(|| format!("Thiếu token: dùng --token hoặc đặt {TOKEN_ENV}"))?;
            let mut client_config = ClientConfig::from_env();
            if let Some(url) = base_url {
                client_config.base_url = url;
            }

            let runtime = tokio::runtime::Runtime::new().context("Không khởi tạo được runtime")?;
            let dashboard = runtime.block_on(async {
                let backend = HttpBackend::new(&client_config)?;
                load_dashboard(&backend, &session, window_start, &config).await
            })?;

            print_summary(&dashboard.summary);
            for record in &dashboard.trends {
                print_trend(record);
            }
        }
    }

    Ok(())
}

fn read_reports(input: &Path, config: &SummaryConfig) -> anyhow::Result<Vec<Report>> {
    let data = std::fs::read_to_string(input)
        .with_context(|| format!("Không đọc được file {:?}", input))?;
    let reports = parse_reports_str(&data, config)?;
    tracing::info!(count = reports.len(), "loaded reports");
    Ok(reports)
}

fn print_summary(summary: &SummaryMetrics) {
    let trends = summary.trending_parameters;
    println!(
        "Total reports: {}\nRecent reports: {}\nShared reports: {}\nAbnormal values: {}\nTrends: {} improving, {} worsening, {} stable",
        summary.total_reports,
        summary.recent_reports,
        summary.shared_reports,
        summary.abnormal_values,
        trends.improving,
        trends.worsening,
        trends.stable
    );
}

fn print_parameters(report: &Report) {
    let date = report
        .date
        .map(|date| date.to_string())
        .unwrap_or_else(|| "--".to_string());
    println!("{} ({date})", report.display_name());

    for parameter in &report.parameters {
        let value = match &parameter.value {
            Some(ParameterValue::Number(number)) => number.to_string(),
            Some(ParameterValue::Text(text)) => text.clone(),
            Some(other) => serde_json::to_string(other).unwrap_or_default(),
            None => "--".to_string(),
        };
        let flag = if parameter_is_abnormal(parameter) { " !" } else { "" };
        println!(
            "  [{}] {}: {} {} (ref {}){flag}",
            parameter.category,
            parameter.name,
            value,
            parameter.unit.as_deref().unwrap_or(""),
            parameter.reference_range.as_deref().unwrap_or("--"),
        );
    }
}

fn print_trend(record: &TrendRecord) {
    let trend = record
        .trend
        .map(|trend| format!("{trend:?}").to_lowercase())
        .unwrap_or_else(|| "not enough data".to_string());
    let values = record
        .points
        .iter()
        .map(|point| format!("{}", point.value))
        .collect::<Vec<_>>()
        .join(" -> ");
    println!(
        "{} [{}]: {values} {}",
        record.name,
        trend,
        record.unit.as_deref().unwrap_or("")
    );
}
