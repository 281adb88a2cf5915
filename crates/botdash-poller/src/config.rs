use botdash_core::config::{
    DEFAULT_PLATFORM_URL, FAILURE_DELAY, INITIALIZING_DELAY, PROVISIONING_DELAY,
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub initializing_delay: Duration,
    pub provisioning_delay: Duration,
    pub failure_delay: Duration,
    /// Consecutive failed or rejected polls after which a session gives up.
    /// `None` retries forever.
    pub max_failures: Option<u32>,
    /// Base URL of the messaging platform used for "test bot" links.
    pub platform_url: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initializing_delay: INITIALIZING_DELAY,
            provisioning_delay: PROVISIONING_DELAY,
            failure_delay: FAILURE_DELAY,
            max_failures: None,
            platform_url: DEFAULT_PLATFORM_URL.to_string(),
        }
    }
}

impl PollerConfig {
    pub fn with_platform_url(mut self, url: impl Into<String>) -> Self {
        self.platform_url = url.into();
        self
    }

    pub fn with_max_failures(mut self, max: Option<u32>) -> Self {
        self.max_failures = max;
        self
    }
}
