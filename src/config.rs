use std::time::Duration;

use reqwest::Url;

pub const DEFAULT_URL: &str = "https://calc.test.trahan.dev/calculated";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Where and how every job sends its request.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl TargetConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_URL).expect("Default URL is valid"))
    }
}
