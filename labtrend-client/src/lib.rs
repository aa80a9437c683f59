//! Client for the lab records backend and the dashboard built on top of it.

mod config;
mod dashboard;
mod error;
mod http;
mod session;

pub use config::{ClientConfig, API_URL_ENV, TIMEOUT_ENV};
pub use dashboard::{load_dashboard, summarize_with_sharing, Dashboard};
pub use error::ClientError;
pub use http::{HttpBackend, RecordsBackend, UserProfile};
pub use session::{Session, TOKEN_ENV};
