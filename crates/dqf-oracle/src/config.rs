use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "DQF_ORACLE_MODEL";
pub const BASE_URL_ENV: &str = "DQF_ORACLE_BASE_URL";

const DEFAULT_MODEL: &str = "gpt-4.1";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(700);
const DEFAULT_MAX_RETRIES: u32 = 2;

/// True when `OPENAI_API_KEY` is set and non-empty.
pub fn have_credentials() -> bool {
    std::env::var(API_KEY_ENV).is_ok_and(|key| !key.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Per-request client timeout.
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl OracleConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            api_key: non_empty(API_KEY_ENV),
            model: non_empty(MODEL_ENV).unwrap_or(defaults.model),
            base_url: non_empty(BASE_URL_ENV)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            ..defaults
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_applies_defaults_and_trims() {
        let config = OracleConfig::from_lookup(|name| match name {
            API_KEY_ENV => Some("  sk-test ".to_string()),
            BASE_URL_ENV => Some("http://localhost:8080/v1/".to_string()),
            MODEL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn blank_key_means_no_credentials() {
        let config = OracleConfig::from_lookup(|name| (name == API_KEY_ENV).then(|| "   ".to_string()));
        assert!(!config.has_credentials());
    }
}
