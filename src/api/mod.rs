// src/api/mod.rs
// =============================================================================
// Everything that talks to the remote API.
//
// Submodules:
// - types: JSON payloads (identities, relationships, rate-limit notices)
// - transport: the "GET with a token" seam, backed by reqwest
// - retry: back-off policy for rate-limited requests
// - fetch: the client that fetches identities and relationship lists
// =============================================================================

mod fetch;
mod retry;
pub mod transport;
mod types;

pub use fetch::{ApiClient, FetchOutcome};
pub use retry::RetryPolicy;
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use types::{Connection, ConnectionKind, Identity, RateLimitNotice, UserId};
