//! Gateway Config

use std::time::Duration;

use clap::Args;

/// Connection settings for the generative model service.
#[derive(Debug, Clone, Args)]
pub struct GatewayConfig {
    /// API key for the model service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Base URL of the model service
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "GATEWAY_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Seconds between video job status polls
    #[arg(long, env = "VIDEO_POLL_INTERVAL_SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,

    /// Maximum number of status polls before a video job is abandoned
    #[arg(long, env = "VIDEO_POLL_MAX_ATTEMPTS", default_value_t = 60)]
    pub poll_max_attempts: u32,
}

impl GatewayConfig {
    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Interval between video job status polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
