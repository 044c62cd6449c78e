use crate::crypto::SigningKey;
use crate::errors::IssuerError;
use crate::models::Jwks;
use tracing::instrument;

/// Publishes the public half of the signing key as a JWKS (RFC 7517).
///
/// The key never changes after startup, so the key-set is derived once at
/// construction. Only `kty`, `use`, `crv`, `kid`, `x`, `y` and `alg` are
/// published; the private scalar never is.
#[derive(Debug, Clone)]
pub struct KeyPublisher {
    jwks: Jwks,
}

impl KeyPublisher {
    /// Derive the verification key and build the key-set.
    ///
    /// # Errors
    ///
    /// `Internal` if the public point cannot be exported.
    #[instrument(name = "issuer.jwks.build", skip_all, fields(key_id = %signing_key.key_id()))]
    pub fn new(signing_key: &SigningKey) -> Result<Self, IssuerError> {
        let verification_key = signing_key.verification_key()?;

        tracing::info!(
            target: "issuer.jwks",
            curve = verification_key.curve(),
            "Verification key derived"
        );

        Ok(Self {
            jwks: Jwks {
                keys: vec![verification_key.to_jwk()],
            },
        })
    }

    /// The one-entry key-set.
    pub fn publish(&self) -> Jwks {
        self.jwks.clone()
    }
}
