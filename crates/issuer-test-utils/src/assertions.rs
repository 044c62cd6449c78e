//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued assertion tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwt::{verify_assertion, Jwks};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default)]
    pub kid: Option<String>,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT is missing segment {index}"));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {index}: {e}"))
}

fn header(token: &str) -> JwtHeader {
    serde_json::from_slice(&segment(token, 0)).expect("Failed to parse JWT header")
}

fn claims(token: &str) -> JwtClaims {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_es256_jwt()
///     .assert_for_subject("did:example:abc123")
///     .assert_signed_by("test-key-2025-01")
///     .assert_window(1_699_999_200);
/// ```
pub trait TokenAssertions {
    /// Assert compact ES256 JWS structure with a 64-byte signature
    fn assert_valid_es256_jwt(&self) -> &Self;

    /// Assert that the token was signed by the specified key
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert `iat == window_start` and `exp == window_start + 3600`
    fn assert_window(&self, window_start: i64) -> &Self;

    /// Assert that the token verifies against `jwks` at `now`
    fn assert_verifies_with(&self, jwks: &Jwks, now: i64) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_es256_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        let header = header(self);
        assert_eq!(header.alg, "ES256", "Expected ES256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        // Claims must parse
        claims(self);

        assert_eq!(
            segment(self, 2).len(),
            64,
            "ES256 signature must be 64 bytes (r || s)"
        );

        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let jwt_header = header(self);

        assert_eq!(
            jwt_header.kid.as_deref(),
            Some(key_id),
            "Expected key_id '{}', got {:?}",
            key_id,
            jwt_header.kid
        );

        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = claims(self);

        assert_eq!(
            claims.sub, subject,
            "Expected subject '{}', got '{}'",
            subject, claims.sub
        );

        self
    }

    fn assert_window(&self, window_start: i64) -> &Self {
        let claims = claims(self);

        assert_eq!(
            claims.iat, window_start,
            "Expected iat {}, got {}",
            window_start, claims.iat
        );
        assert_eq!(
            claims.exp,
            window_start + 3600,
            "Expected exp {}, got {}",
            window_start + 3600,
            claims.exp
        );

        self
    }

    fn assert_verifies_with(&self, jwks: &Jwks, now: i64) -> &Self {
        if let Err(e) = verify_assertion(self, jwks, now) {
            panic!("Token failed verification at {now}: {e:?}");
        }

        self
    }
}
