//! ES256 assertion utilities shared by the issuer and its relying parties.
//!
//! This module provides:
//! - Size limits for DoS prevention
//! - The assertion claims structure (`sub`, `iat`, `exp`)
//! - JWKS wire types (RFC 7517) for EC P-256 keys
//! - Key ID extraction from JWT headers
//! - Offline verification of an assertion against a published JWKS
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only ES256 is accepted
//! - Expiry is checked against a caller-supplied instant, so verification is
//!   reproducible in tests
//! - Generic error messages prevent information leakage
//! - The `sub` field in claims is redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{verify_assertion_now, Jwks};
//!
//! let jwks: Jwks = reqwest::get(jwks_url).await?.json().await?;
//! let claims = verify_assertion_now(&token, &jwks)?;
//! println!("assertion for {} valid until {}", claims.sub, claims.exp);
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Assertions issued by this system are well under 1KB. Anything larger is
/// rejected before base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// JWS algorithm of every assertion.
pub const ASSERTION_ALGORITHM: &str = "ES256";

/// JWK key type for elliptic-curve keys.
pub const EC_KEY_TYPE: &str = "EC";

/// JWK curve name for NIST P-256.
pub const P256_CURVE: &str = "P-256";

/// JWK public key use for signature keys.
pub const SIGNATURE_USE: &str = "sig";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during assertion verification.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The assertion is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure or claims).
    #[error("The assertion is invalid or expired")]
    MalformedToken,

    /// Token header names an algorithm other than ES256.
    #[error("The assertion is invalid or expired")]
    UnsupportedAlgorithm,

    /// The key set holds no ES256 key for the token's `kid`.
    #[error("The assertion is invalid or expired")]
    NoMatchingKey,

    /// Signature does not verify against any candidate key.
    #[error("The assertion is invalid or expired")]
    InvalidSignature,

    /// The verifying instant is at or after `exp`.
    #[error("The assertion is invalid or expired")]
    Expired,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Identity assertion claims.
///
/// - `sub`: Subject (decentralized identifier)
/// - `iat`: Issued-at, always the start of the issuance window
/// - `exp`: Expiry, always `iat + 3600`
///
/// The `sub` field is redacted in Debug output; DIDs may identify a person.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Subject (decentralized identifier) - redacted in Debug output.
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for AssertionClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionClaims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl AssertionClaims {
    /// Creates a new `AssertionClaims` instance.
    #[must_use]
    pub fn new(sub: String, iat: i64, exp: i64) -> Self {
        Self { sub, iat, exp }
    }

    /// Whether the assertion is expired at `now` (Unix epoch seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

// =============================================================================
// JWKS Types
// =============================================================================

/// JSON Web Key Set (RFC 7517).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Published keys.
    pub keys: Vec<JsonWebKey>,
}

impl Jwks {
    /// Look up a key by its `kid`.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// EC public JSON Web Key (RFC 7517 / RFC 7518 section 6.2).
///
/// `x` and `y` are the unpadded base64url encodings of the 32-byte big-endian
/// affine coordinates. A private `d` member is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type ("EC").
    pub kty: String,
    /// Public key use ("sig").
    #[serde(rename = "use")]
    pub use_: String,
    /// Curve ("P-256").
    pub crv: String,
    /// Key ID.
    pub kid: String,
    /// X coordinate (base64url, no padding).
    pub x: String,
    /// Y coordinate (base64url, no padding).
    pub y: String,
    /// Algorithm ("ES256").
    pub alg: String,
}

impl JsonWebKey {
    /// Build an ES256 signature key from raw big-endian coordinates.
    #[must_use]
    pub fn es256(kid: &str, x: &[u8], y: &[u8]) -> Self {
        Self {
            kty: EC_KEY_TYPE.to_string(),
            use_: SIGNATURE_USE.to_string(),
            crv: P256_CURVE.to_string(),
            kid: kid.to_string(),
            x: URL_SAFE_NO_PAD.encode(x),
            y: URL_SAFE_NO_PAD.encode(y),
            alg: ASSERTION_ALGORITHM.to_string(),
        }
    }

    /// Whether this key can verify ES256 assertions.
    #[must_use]
    pub fn is_es256(&self) -> bool {
        self.kty == EC_KEY_TYPE && self.crv == P256_CURVE && self.alg == ASSERTION_ALGORITHM
    }

    /// Decode the `x` and `y` coordinates into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `base64::DecodeError` if either coordinate is not valid
    /// unpadded base64url.
    pub fn coordinates(&self) -> Result<(Vec<u8>, Vec<u8>), base64::DecodeError> {
        Ok((URL_SAFE_NO_PAD.decode(&self.x)?, URL_SAFE_NO_PAD.decode(&self.y)?))
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// Assertions carry a `kid`, but tokens from older issuers may omit it, so a
/// missing `kid` is `Ok(None)` rather than an error.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Wrong structure, bad base64, invalid JSON, or a
///   non-string `kid`
pub fn extract_kid(token: &str) -> Result<Option<String>, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    match header.get("kid") {
        None => Ok(None),
        Some(serde_json::Value::String(kid)) if !kid.is_empty() => Ok(Some(kid.clone())),
        Some(_) => Err(JwtValidationError::MalformedToken),
    }
}

/// Verify an ES256 assertion against a published key set at instant `now`.
///
/// Validates, in order:
/// - Token size (must be <= `MAX_JWT_SIZE_BYTES`)
/// - Header algorithm is ES256
/// - A key with the token's `kid` exists (all ES256 keys are tried when the
///   token has no `kid`)
/// - Signature
/// - Expiry: `now` must be strictly before `exp`
///
/// # Errors
///
/// Returns the `JwtValidationError` variant of the first failed check.
pub fn verify_assertion(
    token: &str,
    jwks: &Jwks,
    now: i64,
) -> Result<AssertionClaims, JwtValidationError> {
    let kid = extract_kid(token)?;

    let header = jsonwebtoken::decode_header(token).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header");
        JwtValidationError::MalformedToken
    })?;

    if header.alg != Algorithm::ES256 {
        tracing::debug!(target: "common.jwt", alg = ?header.alg, "Token rejected: algorithm not allowed");
        return Err(JwtValidationError::UnsupportedAlgorithm);
    }

    let candidates: Vec<&JsonWebKey> = jwks
        .keys
        .iter()
        .filter(|k| k.is_es256())
        .filter(|k| kid.as_deref().map_or(true, |kid| k.kid == kid))
        .collect();

    if candidates.is_empty() {
        tracing::debug!(target: "common.jwt", "Token rejected: no matching key in JWKS");
        return Err(JwtValidationError::NoMatchingKey);
    }

    // Expiry is checked below against `now`, not the wall clock.
    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let mut last_error = JwtValidationError::InvalidSignature;
    for jwk in candidates {
        let key = match DecodingKey::from_ec_components(&jwk.x, &jwk.y) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(target: "common.jwt", error = %e, "Skipping unusable JWK");
                continue;
            }
        };

        match jsonwebtoken::decode::<AssertionClaims>(token, &key, &validation) {
            Ok(data) => {
                if data.claims.is_expired_at(now) {
                    tracing::debug!(
                        target: "common.jwt",
                        exp = data.claims.exp,
                        now = now,
                        "Token rejected: expired"
                    );
                    return Err(JwtValidationError::Expired);
                }
                return Ok(data.claims);
            }
            Err(e) => {
                tracing::debug!(target: "common.jwt", error = %e, "Token verification failed");
                last_error = match e.kind() {
                    ErrorKind::InvalidSignature => JwtValidationError::InvalidSignature,
                    _ => JwtValidationError::MalformedToken,
                };
            }
        }
    }

    Err(last_error)
}

/// Verify an ES256 assertion against a published key set using the wall clock.
///
/// # Errors
///
/// See [`verify_assertion`].
pub fn verify_assertion_now(token: &str, jwks: &Jwks) -> Result<AssertionClaims, JwtValidationError> {
    verify_assertion(token, jwks, chrono::Utc::now().timestamp())
}
