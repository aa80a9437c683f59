//! Explicit session passed to every authenticated call.

/// Environment variable consulted when no token is given explicitly.
pub const TOKEN_ENV: &str = "LABTREND_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Explicit token first, then [`TOKEN_ENV`]. Blank values are ignored.
    pub fn resolve(explicit: Option<String>) -> Option<Self> {
        Self::from_sources(explicit, std::env::var(TOKEN_ENV).ok())
    }

    pub fn from_sources(explicit: Option<String>, environment: Option<String>) -> Option<Self> {
        explicit
            .into_iter()
            .chain(environment)
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty())
            .map(Self::new)
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_token_wins() {
        let session = Session::from_sources(Some("abc".into()), Some("env".into())).unwrap();
        assert_eq!(session.authorization(), "Bearer abc");
    }

    #[test]
    fn blank_explicit_falls_back_to_environment() {
        let session = Session::from_sources(Some("  ".into()), Some("env-token\n".into())).unwrap();
        assert_eq!(session.authorization(), "Bearer env-token");
        assert_eq!(Session::from_sources(None, None), None);
    }
}
