use labtrend_core::RecordsError;

/// Failures talking to the records backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Backend is not reachable at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Backend returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Session is missing or expired")]
    Unauthorized,

    #[error("Malformed backend response: {0}")]
    Decode(String),

    #[error(transparent)]
    Records(#[from] RecordsError),
}

impl ClientError {
    /// The UI layer sends the user back to sign-in on this.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
