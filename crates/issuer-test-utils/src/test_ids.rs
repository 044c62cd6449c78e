//! Fixed test identifiers and instants for deterministic tests
//!
//! Window-sensitive tests pin the clock to these instants instead of
//! `Utc::now()` so they cannot straddle an hour boundary.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

// Subject DIDs
pub const TEST_DID_ALICE: &str = "did:example:abc123";
pub const TEST_DID_BOB: &str = "did:example:bob456";
pub const TEST_DID_KEY: &str = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";

// Signing Key IDs (strings)
pub const TEST_KEY_ID_1: &str = "test-key-2025-01";
pub const TEST_KEY_ID_2: &str = "test-key-2025-02";

// Instants (seconds since the epoch)
pub const EXAMPLE_INSTANT: i64 = 1_700_000_000;
pub const EXAMPLE_WINDOW_START: i64 = 1_699_999_200;
pub const EXAMPLE_EXPIRY: i64 = 1_700_002_800;

/// `DateTime<Utc>` for a whole-second timestamp.
pub fn instant(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(|| panic!("timestamp {timestamp} out of range"))
}

/// A fresh subject DID, unique per call.
pub fn unique_did() -> String {
    format!("did:example:{}", Uuid::new_v4().simple())
}
