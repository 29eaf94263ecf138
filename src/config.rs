use std::time::Duration;

use anyhow::Context;

use crate::predict;

/// Runtime configuration, resolved once at startup and passed to whichever
/// command needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub predict_api_url: String,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            predict_api_url: std::env::var("PREDICT_API_URL")
                .unwrap_or_else(|_| predict::DEFAULT_API_URL.to_string()),
            http_timeout: parse_secs(
                std::env::var("PREDICT_HTTP_TIMEOUT_SECS").ok(),
                predict::DEFAULT_HTTP_TIMEOUT,
            ),
            poll_interval: parse_secs(
                std::env::var("PREDICT_POLL_INTERVAL_SECS").ok(),
                predict::DEFAULT_POLL_INTERVAL,
            ),
            poll_max_attempts: parse_count(
                std::env::var("PREDICT_POLL_MAX_ATTEMPTS").ok(),
                predict::DEFAULT_POLL_MAX_ATTEMPTS,
            ),
        }
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}

fn parse_secs(value: Option<String>, default: Duration) -> Duration {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn parse_count(value: Option<String>, default: u32) -> u32 {
    value
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(default)
}
