// src/api/transport.rs
// =============================================================================
// The HTTP seam between the crawler and the network.
//
// The crawler only ever needs "GET this URL with this token, give me the
// status and the body". Putting that behind a trait means:
// - production code uses reqwest (HttpTransport)
// - tests script the responses (testing::ScriptedTransport) and never touch
//   the network
//
// A transport holds no per-call state, so one instance is shared (behind an
// Arc) by every fetch of a crawl.
// =============================================================================

use crate::error::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use url::Url;

/// Status code and raw body of a response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one GET request, attaching `credential` as the authorization
    async fn get(&self, url: &Url, credential: &str) -> Result<HttpResponse>;
}

/// reqwest-backed transport used by the CLI
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mutual-graph/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, credential: &str) -> Result<HttpResponse> {
        // The token goes in verbatim: user tokens carry no "Bearer " prefix
        let response = self
            .client
            .get(url.clone())
            .header(header::AUTHORIZATION, credential)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why #[async_trait]?
//    - the crawler stores the transport as Arc<dyn Transport>
//    - async_trait boxes each returned future so the trait stays usable as a
//      trait object
//
// 2. Why Send + Sync?
//    - the crawl runs inside tokio::spawn, which may move it between threads,
//      and every fetch of the crawl shares the same transport
// -----------------------------------------------------------------------------
