//! ES256 signing key loading, public key derivation and assertion signing.
//!
//! The signing key is parsed once at startup from PKCS#8 PEM text and never
//! leaves this module in any form other than signatures and the derived
//! public point.
//!
//! Signatures use RFC 6979 deterministic nonces, so the same key, key ID and
//! claims always produce byte-identical tokens, across processes as well as
//! within one.

use crate::errors::IssuerError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::jwt::{AssertionClaims, JsonWebKey, ASSERTION_ALGORITHM, P256_CURVE};
use common::secret::{ExposeSecret, SecretString};
use p256::ecdsa::signature::Signer;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePrivateKey;
use serde::Serialize;
use std::fmt;
use tracing::instrument;

/// Width of a P-256 affine coordinate in bytes.
pub const COORDINATE_LEN: usize = 32;

/// Replace literal `\n` escape sequences with real newlines.
///
/// Deployment platforms commonly store multi-line PEM values on a single
/// line with escaped newlines.
pub fn unescape_pem(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

/// Process-wide ES256 signing key.
///
/// Debug output never includes the private scalar.
pub struct SigningKey {
    key_id: String,
    inner: p256::ecdsa::SigningKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("curve", &P256_CURVE)
            .field("scalar", &"[REDACTED]")
            .finish()
    }
}

/// JWS protected header. Field order is fixed so encoding is deterministic.
#[derive(Serialize)]
struct JwsHeader<'a> {
    alg: &'a str,
    typ: &'a str,
    kid: &'a str,
}

impl SigningKey {
    /// Parse a P-256 private key from PKCS#8 PEM text.
    ///
    /// Literal `\n` sequences are unescaped first. Any parse failure, including
    /// a key on a curve other than P-256, is a configuration error.
    #[instrument(skip_all, fields(key_id = %key_id))]
    pub fn from_pkcs8_pem(pem: &SecretString, key_id: &str) -> Result<Self, IssuerError> {
        let pem = SecretString::from(unescape_pem(pem.expose_secret()));

        let secret = p256::SecretKey::from_pkcs8_pem(pem.expose_secret().trim()).map_err(|e| {
            tracing::error!(target: "issuer.crypto", error = %e, "Failed to parse signing key");
            IssuerError::Configuration(format!(
                "signing key is not a P-256 PKCS#8 PEM document: {e}"
            ))
        })?;

        Ok(Self {
            key_id: key_id.to_string(),
            inner: p256::ecdsa::SigningKey::from(secret),
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Derive the public verification key by scalar multiplication of the
    /// base point.
    pub fn verification_key(&self) -> Result<VerificationKey, IssuerError> {
        let public_key = p256::PublicKey::from_secret_scalar(self.inner.as_nonzero_scalar());
        let point = public_key.to_encoded_point(false);

        let x = point.x().ok_or_else(|| {
            tracing::error!(target: "issuer.crypto", "Derived public key has no x coordinate");
            IssuerError::Internal
        })?;
        let y = point.y().ok_or_else(|| {
            tracing::error!(target: "issuer.crypto", "Derived public key has no y coordinate");
            IssuerError::Internal
        })?;

        Ok(VerificationKey {
            key_id: self.key_id.clone(),
            x: to_coordinate(x.as_slice())?,
            y: to_coordinate(y.as_slice())?,
        })
    }

    /// Sign assertion claims as a compact ES256 JWS.
    ///
    /// Header is `{"alg":"ES256","typ":"JWT","kid":<key id>}`; the signature
    /// is the 64-byte `r || s` encoding.
    #[instrument(skip_all)]
    pub fn sign_assertion(&self, claims: &AssertionClaims) -> Result<String, IssuerError> {
        let header = JwsHeader {
            alg: ASSERTION_ALGORITHM,
            typ: "JWT",
            kid: &self.key_id,
        };

        let header_json = serde_json::to_vec(&header).map_err(|e| {
            tracing::error!(target: "issuer.crypto", error = %e, "Failed to encode JWS header");
            IssuerError::Internal
        })?;
        let claims_json = serde_json::to_vec(claims).map_err(|e| {
            tracing::error!(target: "issuer.crypto", error = %e, "Failed to encode claims");
            IssuerError::Internal
        })?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );

        let signature: p256::ecdsa::Signature =
            self.inner.try_sign(signing_input.as_bytes()).map_err(|e| {
                tracing::error!(target: "issuer.crypto", error = %e, "ES256 signing operation failed");
                IssuerError::Internal
            })?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

fn to_coordinate(bytes: &[u8]) -> Result<[u8; COORDINATE_LEN], IssuerError> {
    <[u8; COORDINATE_LEN]>::try_from(bytes).map_err(|_| {
        tracing::error!(
            target: "issuer.crypto",
            len = bytes.len(),
            "Public key coordinate has unexpected width"
        );
        IssuerError::Internal
    })
}

/// Public half of the signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationKey {
    pub key_id: String,
    /// Big-endian affine x coordinate.
    pub x: [u8; COORDINATE_LEN],
    /// Big-endian affine y coordinate.
    pub y: [u8; COORDINATE_LEN],
}

impl VerificationKey {
    pub fn curve(&self) -> &'static str {
        P256_CURVE
    }

    /// SEC1 uncompressed point: `0x04 || x || y`.
    pub fn to_sec1_uncompressed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 2 * COORDINATE_LEN);
        out.push(0x04);
        out.extend_from_slice(&self.x);
        out.extend_from_slice(&self.y);
        out
    }

    pub fn to_jwk(&self) -> JsonWebKey {
        JsonWebKey::es256(&self.key_id, &self.x, &self.y)
    }
}
