// src/config.rs
// =============================================================================
// Crawl configuration.
//
// All knobs come from command-line flags (see cli.rs); this struct is what the
// crawler itself consumes, so the core never has to know about clap.
// =============================================================================

use crate::api::RetryPolicy;
use crate::error::{CrawlError, Result};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v9/";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Base URL every endpoint is joined onto
    pub api_base: Url,
    /// Per-request timeout for the HTTP transport
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// How many discovery events may queue up before the crawl waits for the
    /// consumer
    pub channel_capacity: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("default API base is a valid URL"),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            channel_capacity: 16,
        }
    }
}

impl CrawlConfig {
    /// Parse an API base URL, adding the trailing slash `Url::join` needs
    pub fn parse_api_base(raw: &str) -> Result<Url> {
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };

        Url::parse(&normalized)
            .map_err(|e| CrawlError::Config(format!("Invalid API base URL '{}': {}", raw, e)))
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.api_base.scheme(), "http" | "https") {
            return Err(CrawlError::Config(format!(
                "API base must be http or https, got '{}'",
                self.api_base
            )));
        }

        if self.channel_capacity == 0 {
            return Err(CrawlError::Config(
                "Event buffer must hold at least one event".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(CrawlError::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
