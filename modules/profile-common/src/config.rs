use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::HarvestError;

/// Tunables shared by every pass. Built once (env + CLI overrides) and passed
/// explicitly to the components that need it.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    // Politeness / transport
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub user_agent: String,

    // Merge gate
    pub min_gain: usize,

    // Headless render
    pub render_timeout_ms: u64,
    pub render_settle_ms: u64,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 1200,
            timeout_secs: 20,
            max_retries: 4,
            user_agent: "ProfileHarvestBot/1.0".to_string(),
            min_gain: 1,
            render_timeout_ms: 60_000,
            render_settle_ms: 4_000,
            browserless_url: None,
            browserless_token: None,
        }
    }
}

impl HarvestConfig {
    /// Load configuration from environment variables, falling back to defaults.
    /// An unparsable value is a configuration error rather than a silent default.
    pub fn from_env() -> Result<Self, HarvestError> {
        let defaults = Self::default();
        Ok(Self {
            request_delay_ms: parsed_env("REQUEST_DELAY_MS", defaults.request_delay_ms)?,
            timeout_secs: parsed_env("TIMEOUT_SECONDS", defaults.timeout_secs)?,
            max_retries: parsed_env("MAX_RETRIES", defaults.max_retries)?,
            user_agent: env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            min_gain: parsed_env("MIN_GAIN", defaults.min_gain)?,
            render_timeout_ms: parsed_env("RENDER_TIMEOUT_MS", defaults.render_timeout_ms)?,
            render_settle_ms: parsed_env("RENDER_SETTLE_MS", defaults.render_settle_ms)?,
            browserless_url: optional_env("BROWSERLESS_URL"),
            browserless_token: optional_env("BROWSERLESS_TOKEN"),
        })
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    /// Log the effective configuration with secrets redacted.
    pub fn log_redacted(&self) {
        let token = if self.browserless_token.is_some() {
            "[redacted]"
        } else {
            "(none)"
        };
        info!(
            request_delay_ms = self.request_delay_ms,
            timeout_secs = self.timeout_secs,
            max_retries = self.max_retries,
            user_agent = self.user_agent.as_str(),
            min_gain = self.min_gain,
            render_timeout_ms = self.render_timeout_ms,
            render_settle_ms = self.render_settle_ms,
            browserless_url = self.browserless_url.as_deref().unwrap_or("(none)"),
            browserless_token = token,
            "Harvest config"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T, HarvestError> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| HarvestError::Configuration(format!("{key} must be a number, got {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_polite_single_worker_settings() {
        let config = HarvestConfig::default();
        assert_eq!(config.request_delay(), Duration::from_millis(1200));
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.min_gain, 1);
        assert!(config.browserless_url.is_none());
    }

    #[test]
    fn parsed_env_reports_bad_numbers() {
        // Unique key so parallel tests never race on it.
        env::set_var("PROFILE_COMMON_TEST_BAD_NUMBER", "soon");
        let err = parsed_env::<u64>("PROFILE_COMMON_TEST_BAD_NUMBER", 5).unwrap_err();
        assert!(err.to_string().contains("PROFILE_COMMON_TEST_BAD_NUMBER"));
        env::remove_var("PROFILE_COMMON_TEST_BAD_NUMBER");
    }

    #[test]
    fn parsed_env_falls_back_when_unset() {
        assert_eq!(parsed_env("PROFILE_COMMON_TEST_UNSET", 7u32).unwrap(), 7);
    }
}
