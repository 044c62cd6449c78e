use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use common::jwt::{JsonWebKey, Jwks};

/// Length of an assertion validity window in seconds.
pub const WINDOW_SECONDS: i64 = 3600;

/// Clock-aligned one-hour interval `[start, start + 3600)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeWindow {
    start: i64,
}

impl TimeWindow {
    /// Window containing `now`. Floor division, so instants before the epoch
    /// land in the window that starts at or before them.
    pub fn containing(now: DateTime<Utc>) -> Self {
        Self::containing_timestamp(now.timestamp())
    }

    pub fn containing_timestamp(timestamp: i64) -> Self {
        Self {
            start: timestamp.div_euclid(WINDOW_SECONDS) * WINDOW_SECONDS,
        }
    }

    /// Seconds since the epoch at which the window opens.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive end of the window.
    pub fn expires_at(&self) -> i64 {
        self.start + WINDOW_SECONDS
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.expires_at()
    }
}

/// Whether an assertion was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

/// Result of [`TokenIssuer::issue`](crate::services::token_service::TokenIssuer::issue).
#[derive(Clone, PartialEq, Eq)]
pub struct Assertion {
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub cache_status: CacheStatus,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("cache_status", &self.cache_status)
            .finish()
    }
}

/// Response body of `POST /api/get-es256-jwt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Request body of `POST /api/get-es256-jwt`.
///
/// Clients send either `{"did": "<did>"}` or the nested
/// `{"did": {"did": "<did>"}}` shape.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub did: Option<DidField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DidField {
    Plain(String),
    Nested {
        #[serde(default)]
        did: Option<String>,
    },
}

impl TokenRequest {
    /// The subject DID, if present and not blank.
    pub fn subject(&self) -> Option<&str> {
        let did = match self.did.as_ref()? {
            DidField::Plain(did) => did.as_str(),
            DidField::Nested { did } => did.as_deref()?,
        };

        if did.trim().is_empty() {
            None
        } else {
            Some(did)
        }
    }
}
