// src/error.rs
// =============================================================================
// Error types for the crawler core.
//
// The taxonomy follows what can go wrong while talking to the remote API:
// - Authentication: the token was rejected when fetching our own identity
// - Transport / Http: the request never produced a usable response
// - Decode: the response was neither a connection list nor a rate-limit notice
// - Config: the crawl was configured with values we can't work with
//
// Rate limiting is deliberately absent: it is retried inside the fetcher and
// never reaches a caller.
//
// main.rs still uses anyhow for the application glue; these typed errors are
// what the crawler modules return so the CLI can tell them apart.
// =============================================================================

use thiserror::Error;

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

#[derive(Error, Debug)]
pub enum CrawlError {
    /// The API refused the credential (401/403 on the identity call)
    #[error("Invalid token, the API rejected the credential (HTTP {status})")]
    Authentication { status: u16 },

    /// Network-level failure reported by a transport
    #[error("Network error: {0}")]
    Transport(String),

    /// HTTP client errors from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body was neither the payload we asked for nor a rate-limit notice
    #[error("Could not decode response for {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CrawlError {
    /// True when the credential itself was rejected
    ///
    /// The CLI uses this to print a "check your token" message instead of a
    /// generic network failure.
    pub fn is_authentication(&self) -> bool {
        matches!(self, CrawlError::Authentication { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_is_distinct_from_transport() {
        let auth = CrawlError::Authentication { status: 401 };
        let net = CrawlError::Transport("connection reset".to_string());

        assert!(auth.is_authentication());
        assert!(!net.is_authentication());
        assert!(auth.to_string().contains("401"));
    }

    #[test]
    fn test_decode_error_names_target() {
        let source = serde_json::from_str::<Vec<u8>>("nope").unwrap_err();
        let err = CrawlError::Decode {
            target: "users/42/relationships".to_string(),
            source,
        };
        assert!(err.to_string().contains("users/42/relationships"));
    }
}
