// src/crawl/session.rs
// =============================================================================
// This module runs a crawl: our own identity, our own connections, then the
// connections of each of those connections (two levels, no further).
//
// How it works:
// 1. Fetch who we are (a bad token fails right here, before anything streams)
// 2. Fetch our connection list
// 3. Spawn a background task that walks that list in order, fetching each
//    connection's own list and sending one DiscoveryEvent per connection
// 4. The caller reads events from the CrawlSession while the task runs
//
// Stopping:
// - cancel() sets a token that the task checks before each connection; a
//   fetch already in progress (including its rate-limit sleeps) finishes first
// - a real fetch failure ends the stream early
// - dropping the session stops the task at its next send
//
// The stream only ever grows: nothing already sent is taken back, so a
// consumer can treat whatever it received as a valid partial result.
// =============================================================================

use crate::api::{ApiClient, Identity, UserId};
use crate::error::Result;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The connection list of one crawled user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryEvent {
    /// Whose connections these are
    #[serde(rename = "id")]
    pub source_id: UserId,
    /// Their connections, in the order the API returned them
    #[serde(rename = "relationships")]
    pub neighbor_ids: Vec<UserId>,
    /// 1-based position of the source in our own connection list
    #[serde(rename = "index")]
    pub sequence_index: usize,
    pub total: usize,
}

impl DiscoveryEvent {
    /// True for the event of the last connection in our list
    pub fn is_last(&self) -> bool {
        self.sequence_index == self.total
    }
}

/// Why the event stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStatus {
    /// Every connection was crawled
    Completed,
    /// Stopped by cancel() or because the reader went away
    Cancelled,
    /// A fetch failed with a real (non rate-limit) error
    Aborted(String),
}

/// Owner of crawls: at most one is running per Crawler
///
/// Starting a new crawl cancels the previous one.
pub struct Crawler {
    client: Arc<ApiClient>,
    channel_capacity: usize,
    active: Option<CancellationToken>,
}

impl Crawler {
    pub fn new(client: ApiClient, channel_capacity: usize) -> Self {
        Self {
            client: Arc::new(client),
            channel_capacity: channel_capacity.max(1),
            active: None,
        }
    }

    /// Start crawling on behalf of `credential`
    ///
    /// Returns once our identity and connection list are known; the rest of
    /// the crawl streams through the returned session.
    pub async fn crawl(&mut self, credential: &str) -> Result<CrawlSession> {
        // Only one crawl at a time: stop whatever we started last
        self.cancel();

        // Pasted tokens often carry a trailing newline
        let credential = credential.trim().to_string();

        let mut identity = self.client.fetch_identity(&credential).await?;
        info!(user = %identity.id, username = %identity.username, "authenticated");

        let own = self
            .client
            .fetch_connections(&credential, &UserId::me())
            .await?;
        if own.degraded {
            warn!("own connection list stayed rate limited, crawling nothing");
        }
        // Keep every connection, pending ones included; the graph builder
        // decides later which of them count
        identity.connections = own.connections;

        let targets: Vec<UserId> = identity
            .connections
            .iter()
            .map(|connection| connection.id.clone())
            .collect();
        info!(total = targets.len(), "starting crawl");

        // The rest runs in the background and reports through the channel
        let cancel = CancellationToken::new();
        let (sender, receiver) = mpsc::channel(self.channel_capacity);
        let handle = tokio::spawn(run_crawl(
            self.client.clone(),
            credential,
            targets,
            sender,
            cancel.clone(),
        ));

        self.active = Some(cancel.clone());

        Ok(CrawlSession {
            identity,
            receiver,
            cancel,
            handle,
        })
    }

    /// Stop the active crawl, if any. Calling it again does nothing.
    pub fn cancel(&mut self) {
        if let Some(token) = self.active.take() {
            debug!("cancelling active crawl");
            token.cancel();
        }
    }
}

/// One running crawl: our identity plus the stream of discovery events
pub struct CrawlSession {
    /// Who we are, with our full (unfiltered) connection list attached
    pub identity: Identity,
    receiver: mpsc::Receiver<DiscoveryEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<CrawlStatus>,
}

impl CrawlSession {
    /// Wait for the next event; None once the crawl has stopped
    pub async fn next_event(&mut self) -> Option<DiscoveryEvent> {
        self.receiver.recv().await
    }

    /// The events as a futures Stream
    pub fn events(&mut self) -> impl Stream<Item = DiscoveryEvent> + Unpin + '_ {
        futures::stream::poll_fn(move |cx| self.receiver.poll_recv(cx))
    }

    /// Ask the crawl to stop before its next connection
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this crawl, for handing to other tasks
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the crawl task to stop and report why it stopped
    ///
    /// Events still queued are dropped, which also unblocks the task.
    pub async fn finish(self) -> CrawlStatus {
        drop(self.receiver);
        match self.handle.await {
            Ok(status) => status,
            Err(e) => CrawlStatus::Aborted(format!("crawl task failed: {}", e)),
        }
    }

    /// Drain every remaining event, then report the final status
    pub async fn collect(mut self) -> (Identity, Vec<DiscoveryEvent>, CrawlStatus) {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        let identity = self.identity.clone();
        let status = self.finish().await;
        (identity, events, status)
    }
}

async fn run_crawl(
    client: Arc<ApiClient>,
    credential: String,
    targets: Vec<UserId>,
    sender: mpsc::Sender<DiscoveryEvent>,
    cancel: CancellationToken,
) -> CrawlStatus {
    let total = targets.len();

    for (i, target) in targets.into_iter().enumerate() {
        // Checked between connections only, never in the middle of a fetch
        if cancel.is_cancelled() {
            info!(crawled = i, total, "crawl cancelled");
            return CrawlStatus::Cancelled;
        }

        debug!(user = %target, index = i + 1, total, "fetching connection");
        let outcome = match client.fetch_connections(&credential, &target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(user = %target, error = %e, "crawl aborted");
                return CrawlStatus::Aborted(e.to_string());
            }
        };

        if outcome.degraded {
            warn!(user = %target, "reporting no connections after exhausting retries");
        }
        debug!(
            user = %target,
            attempts = outcome.attempts,
            connections = outcome.connections.len(),
            "fetched connection"
        );

        // Indices are 1-based so the last event has index == total
        let event = DiscoveryEvent {
            source_id: target,
            neighbor_ids: outcome
                .connections
                .into_iter()
                .map(|connection| connection.id)
                .collect(),
            sequence_index: i + 1,
            total,
        };

        // Waits while the channel is full; fails once the reader is gone
        if sender.send(event).await.is_err() {
            debug!("event reader went away, stopping crawl");
            return CrawlStatus::Cancelled;
        }
    }

    info!(total, "crawl complete");
    CrawlStatus::Completed
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is mpsc::channel?
//    - "multi-producer, single-consumer" queue between async tasks
//    - send() waits while the buffer is full, which keeps a slow reader from
//      being flooded; recv() returns None once every sender is dropped
//    - the crawl task owns the only Sender, so returning from run_crawl is
//      what closes the stream
//
// 2. What is a CancellationToken?
//    - a shared flag from tokio-util: cancel() on one clone is visible to all
//    - we only *check* it between connections, so a fetch that is already
//      waiting out a rate limit finishes first (cooperative cancellation)
//
// 3. Why does crawl() take &mut self?
//    - the Crawler remembers the token of the crawl it started last
//    - starting another crawl cancels that one, so only one runs at a time
//
// 4. What is a JoinHandle?
//    - what tokio::spawn gives back; awaiting it yields the task's return
//      value, here the CrawlStatus explaining why the stream ended
// -----------------------------------------------------------------------------
