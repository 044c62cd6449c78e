//! Observability for the issuer service.
//!
//! # Privacy by Default
//!
//! All instrumentation uses `#[instrument(skip_all)]` and explicit safe field allow-listing.
//! Fields are categorized as:
//! - **SAFE**: Can be logged in plaintext (cache status, window start, key ID)
//! - **HASHED**: Must be SHA-256 hashed for correlation (subject DID)
//! - **NEVER**: Must never appear in logs (signing key, issued tokens)

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// Used for subject DIDs, which need correlation across log entries but
/// should not be stored in plaintext.
///
/// This is a one-way hash for correlation only, not a secret-protecting
/// construction.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let prefix = digest.get(..4).unwrap_or_default();
    hex::encode(prefix)
}
