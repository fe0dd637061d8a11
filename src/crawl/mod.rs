// src/crawl/mod.rs
// =============================================================================
// This module handles crawling the connection graph.
//
// Features:
// - Two levels only: our connections, then each of their connections
// - Results stream out as they arrive instead of after the whole crawl
// - Cooperative cancellation (Ctrl-C in the CLI, or starting a new crawl)
// - Rate limits are waited out by the API client, never surfaced here
// =============================================================================

mod session;

pub use session::{CrawlSession, CrawlStatus, Crawler, DiscoveryEvent};
