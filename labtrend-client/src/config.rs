/// Connection settings for the records backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

pub const API_URL_ENV: &str = "LABTREND_API_URL";
pub const TIMEOUT_ENV: &str = "LABTREND_TIMEOUT_SECS";

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `LABTREND_API_URL` / `LABTREND_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup(TIMEOUT_ENV).and_then(|secs| secs.trim().parse().ok()) {
            config.timeout_secs = secs;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_defaults() {
        let config = ClientConfig::from_lookup(|key| match key {
            API_URL_ENV => Some("https://records.example.org/api/".into()),
            TIMEOUT_ENV => Some("nope".into()),
            _ => None,
        });
        assert_eq!(config.base_url, "https://records.example.org/api");
        assert_eq!(config.timeout_secs, 30);
    }
}
