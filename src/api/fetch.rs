// src/api/fetch.rs
// =============================================================================
// Fetching identities and relationship lists from the remote API.
//
// Relationship lists are where rate limiting bites: crawling means one
// request per connection, and the API answers with
//   {"message": "...", "retry_after": 1.2, "global": false}
// instead of a list when we go too fast.
//
// Strategy for one target:
// 1. GET users/{id}/relationships
// 2. Body decodes as a list? Done.
// 3. Body is a rate-limit notice? Sleep retry_after + back-off, go to 1.
// 4. Anything else is a real failure and is returned without retrying.
// 5. Still throttled after the last retry? Return an empty list, flagged as
//    degraded, instead of an error.
// =============================================================================

use super::retry::RetryPolicy;
use super::transport::{HttpResponse, Transport};
use super::types::{Connection, Identity, RateLimitNotice, UserId};
use crate::error::{CrawlError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Result of fetching one relationship list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub connections: Vec<Connection>,
    /// Number of requests sent for this target
    pub attempts: u32,
    /// The list is empty only because we ran out of retries
    pub degraded: bool,
}

/// Client for the two endpoints the crawler needs
///
/// Cheap to share: the transport is behind an Arc and the retry counters live
/// on the stack of each call.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            transport,
            base_url,
            retry,
        }
    }

    /// Fetch the identity that owns `credential`
    ///
    /// Not retried. A 401/403 means the token is bad and is reported as
    /// `CrawlError::Authentication`.
    pub async fn fetch_identity(&self, credential: &str) -> Result<Identity> {
        let url = self.endpoint("users/@me")?;
        debug!(%url, "fetching identity");

        let response = self.transport.get(&url, credential).await?;
        if response.is_unauthorized() {
            return Err(CrawlError::Authentication {
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|source| CrawlError::Decode {
            target: "users/@me".to_string(),
            source,
        })
    }

    /// Fetch the relationship list of `target`, waiting out rate limits
    pub async fn fetch_connections(&self, credential: &str, target: &UserId) -> Result<FetchOutcome> {
        let path = format!("users/{}/relationships", target);
        let url = self.endpoint(&path)?;

        let mut backoff = Duration::ZERO;
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(user = %target, attempt = attempts, "fetching relationships");

            // Transport failures are not rate limits, so they are never retried
            let response = self.transport.get(&url, credential).await?;
            let notice = match decode_connections(&path, &response)? {
                Decoded::Connections(connections) => {
                    return Ok(FetchOutcome {
                        connections,
                        attempts,
                        degraded: false,
                    });
                }
                Decoded::RateLimited(notice) => notice,
            };

            // Out of retries: give up on this target without failing the crawl
            if attempts > self.retry.max_retries {
                warn!(
                    user = %target,
                    attempts,
                    "still rate limited after {} retries, treating as no connections",
                    self.retry.max_retries
                );
                return Ok(FetchOutcome {
                    connections: Vec::new(),
                    attempts,
                    degraded: true,
                });
            }

            // Wait what the server asked for, plus our own growing back-off
            backoff = self.retry.next_backoff(backoff);
            let delay = self.retry.delay(notice.retry_after, backoff);
            warn!(
                user = %target,
                attempt = attempts,
                global = notice.global,
                delay_secs = delay.as_secs_f64(),
                "rate limited: {}",
                notice.message
            );

            tokio::time::sleep(delay).await;
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CrawlError::Config(format!("Cannot build URL for {}: {}", path, e)))
    }
}

enum Decoded {
    Connections(Vec<Connection>),
    RateLimited(RateLimitNotice),
}

// Only bodies carrying the rate-limit marker are considered for retry; any
// other body that isn't a list fails with the list's own decode error.
fn decode_connections(path: &str, response: &HttpResponse) -> Result<Decoded> {
    let list_error = match serde_json::from_slice::<Vec<Connection>>(&response.body) {
        Ok(connections) => return Ok(Decoded::Connections(connections)),
        Err(e) => e,
    };

    if !RateLimitNotice::looks_like(&response.body) {
        return Err(CrawlError::Decode {
            target: path.to_string(),
            source: list_error,
        });
    }

    serde_json::from_slice::<RateLimitNotice>(&response.body)
        .map(Decoded::RateLimited)
        .map_err(|source| CrawlError::Decode {
            target: path.to_string(),
            source,
        })
}
