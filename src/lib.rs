// src/lib.rs
// =============================================================================
// mutual-graph: crawl your connections and map who is connected to whom.
//
// Modules:
// - api: remote API client, HTTP transport and rate-limit retries
// - crawl: the two-level crawl and its stream of discovery events
// - graph: turning discovery events into a filtered, labelled graph
// - config / error / logging: the plumbing around them
//
// The binary in main.rs is a thin shell over this library.
// =============================================================================

pub mod api;
pub mod config;
pub mod crawl;
pub mod error;
pub mod graph;
pub mod logging;

pub use error::{CrawlError, Result};
