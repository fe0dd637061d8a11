// src/api/types.rs
// =============================================================================
// Payload types for the remote API.
//
// These mirror the JSON the API sends back:
// - GET users/@me                 -> Identity
// - GET users/{id}/relationships  -> [Connection]
// - any endpoint when throttled   -> RateLimitNotice
//
// Everything here is plain value data: created by a fetch, never mutated
// afterwards, and serializable again without losing fields.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id of a user on the remote API
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// The API alias for "the user owning the token"
    pub fn me() -> Self {
        UserId("@me".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user account: either the authenticated user or someone we discovered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    /// Display name; the API sends null for accounts that never set one
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub public_flags: i64,
    /// Our own connection list, attached by the crawler after fetching it
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
}

impl Identity {
    /// Label used when this user becomes a graph node
    pub fn label(&self) -> &str {
        &self.username
    }
}

/// Relationship class, sent by the API as the integer `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ConnectionKind {
    None,
    /// Mutual, accepted relationship; the only kind that becomes a graph node
    Accepted,
    Blocked,
    PendingIncoming,
    PendingOutgoing,
    Implicit,
    Other(i64),
}

impl ConnectionKind {
    pub fn is_accepted(self) -> bool {
        self == ConnectionKind::Accepted
    }
}

impl From<i64> for ConnectionKind {
    fn from(value: i64) -> Self {
        match value {
            0 => ConnectionKind::None,
            1 => ConnectionKind::Accepted,
            2 => ConnectionKind::Blocked,
            3 => ConnectionKind::PendingIncoming,
            4 => ConnectionKind::PendingOutgoing,
            5 => ConnectionKind::Implicit,
            other => ConnectionKind::Other(other),
        }
    }
}

impl From<ConnectionKind> for i64 {
    fn from(kind: ConnectionKind) -> Self {
        match kind {
            ConnectionKind::None => 0,
            ConnectionKind::Accepted => 1,
            ConnectionKind::Blocked => 2,
            ConnectionKind::PendingIncoming => 3,
            ConnectionKind::PendingOutgoing => 4,
            ConnectionKind::Implicit => 5,
            ConnectionKind::Other(other) => other,
        }
    }
}

/// One entry of a relationship list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: UserId,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    #[serde(default)]
    pub nickname: Option<String>,
    pub user: Identity,
}

/// Body the API sends instead of the payload when we are being throttled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitNotice {
    pub message: String,
    /// Seconds to wait before the next request (sub-second precision)
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
}

impl RateLimitNotice {
    /// Substring that marks a body as a rate-limit notice
    pub const MARKER: &'static str = "retry_after";

    pub fn looks_like(body: &[u8]) -> bool {
        let marker = Self::MARKER.as_bytes();
        body.windows(marker.len()).any(|window| window == marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELATIONSHIPS: &str = r#"[
        {
            "id": "200",
            "type": 1,
            "nickname": null,
            "user": {
                "id": "200",
                "username": "ferris",
                "global_name": "Ferris",
                "avatar": "abc123",
                "discriminator": "0",
                "public_flags": 64
            }
        },
        {
            "id": "300",
            "type": 9,
            "user": {
                "id": "300",
                "username": "corro",
                "global_name": null,
                "avatar": null,
                "discriminator": "0042",
                "public_flags": 0
            }
        }
    ]"#;

    #[test]
    fn test_decode_relationship_list() {
        let connections: Vec<Connection> = serde_json::from_str(RELATIONSHIPS).unwrap();
        assert_eq!(connections.len(), 2);

        assert_eq!(connections[0].id, UserId::from("200"));
        assert_eq!(connections[0].kind, ConnectionKind::Accepted);
        assert_eq!(connections[0].user.label(), "ferris");
        assert_eq!(connections[0].user.public_flags, 64);

        assert_eq!(connections[1].kind, ConnectionKind::Other(9));
        assert_eq!(connections[1].user.global_name, None);
    }

    #[test]
    fn test_unknown_kind_survives_reencoding() {
        let connections: Vec<Connection> = serde_json::from_str(RELATIONSHIPS).unwrap();
        let encoded = serde_json::to_value(&connections).unwrap();
        assert_eq!(encoded[1]["type"], 9);

        let decoded: Vec<Connection> = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, connections);
    }

    #[test]
    fn test_rate_limit_notice() {
        let body = br#"{"message": "You are being rate limited.", "retry_after": 0.25, "global": false}"#;
        assert!(RateLimitNotice::looks_like(body));

        let notice: RateLimitNotice = serde_json::from_slice(body).unwrap();
        assert_eq!(notice.retry_after, 0.25);
        assert!(!notice.global);

        assert!(!RateLimitNotice::looks_like(b"<html>502 Bad Gateway</html>"));
    }

    #[test]
    fn test_only_accepted_kind_is_accepted() {
        assert!(ConnectionKind::from(1).is_accepted());
        for kind in [0, 2, 3, 4, 5, 42] {
            assert!(!ConnectionKind::from(kind).is_accepted());
        }
    }
}
