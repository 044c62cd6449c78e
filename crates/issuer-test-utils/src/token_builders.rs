//! Builder patterns for test data construction
//!
//! Builds ES256 assertions outside the issuer (signed with `jsonwebtoken`)
//! for forged-key, tampered-payload and clock-edge verification tests.

use crate::crypto_fixtures::FixtureError;
use crate::test_ids::{EXAMPLE_EXPIRY, EXAMPLE_WINDOW_START, TEST_DID_ALICE, TEST_KEY_ID_1};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwt::AssertionClaims;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

/// Builder for assertion tokens signed by an arbitrary key
///
/// # Example
/// ```rust,ignore
/// let forged = TestAssertionBuilder::new()
///     .for_subject("did:example:abc123")
///     .with_kid(TEST_KEY_ID_1)
///     .sign_with_pem(&test_signing_key_pem(99)?)?;
/// ```
pub struct TestAssertionBuilder {
    sub: String,
    iat: i64,
    exp: i64,
    kid: Option<String>,
}

impl Default for TestAssertionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAssertionBuilder {
    /// Create a builder for the example subject and window
    pub fn new() -> Self {
        Self {
            sub: TEST_DID_ALICE.to_string(),
            iat: EXAMPLE_WINDOW_START,
            exp: EXAMPLE_EXPIRY,
            kid: Some(TEST_KEY_ID_1.to_string()),
        }
    }

    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    /// Sign with a P-256 PKCS#8 PEM key
    pub fn sign_with_pem(&self, pem: &str) -> Result<String, FixtureError> {
        let key = EncodingKey::from_ec_pem(pem.as_bytes())
            .map_err(|e| FixtureError::Crypto(format!("Invalid EC PEM: {e}")))?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid = self.kid.clone();

        let claims = AssertionClaims::new(self.sub.clone(), self.iat, self.exp);
        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|e| FixtureError::Crypto(format!("Failed to sign test assertion: {e}")))
    }
}

/// Replace the payload of a signed token, keeping its header and signature.
pub fn tamper_payload(token: &str, subject: &str, iat: i64, exp: i64) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "JWT must have 3 parts");

    let payload = serde_json::to_vec(&AssertionClaims::new(subject.to_string(), iat, exp))
        .expect("claims serialize");

    format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(payload),
        parts[2]
    )
}
