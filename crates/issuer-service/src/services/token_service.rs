use crate::crypto::SigningKey;
use crate::errors::IssuerError;
use crate::models::{Assertion, CacheStatus, TimeWindow};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_token_issuance, set_assertion_cache_entries};
use crate::services::assertion_cache::{AssertionCache, CachedAssertion, InsertOutcome};
use chrono::{DateTime, Utc};
use common::jwt::AssertionClaims;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Issues ES256 assertions bound to a clock-aligned one-hour window.
///
/// Tokens are memoized per subject for the current window. Signing is
/// deterministic, so a cache miss and a cache hit for the same subject and
/// window return byte-identical tokens.
#[derive(Debug)]
pub struct TokenIssuer {
    signing_key: Arc<SigningKey>,
    cache: AssertionCache,
}

impl TokenIssuer {
    pub fn new(signing_key: Arc<SigningKey>, cache_capacity: usize) -> Self {
        Self {
            signing_key,
            cache: AssertionCache::new(cache_capacity),
        }
    }

    pub fn cache(&self) -> &AssertionCache {
        &self.cache
    }

    /// Issue (or return the memoized) assertion for `subject` at `now`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when `subject` is empty or whitespace
    /// - `Internal` when signing fails
    #[instrument(
        name = "issuer.token.issue",
        skip_all,
        fields(subject = %hash_for_correlation(subject), window_start, cache_status)
    )]
    pub fn issue(&self, subject: &str, now: DateTime<Utc>) -> Result<Assertion, IssuerError> {
        let start = Instant::now();
        let result = self.issue_inner(subject, now);

        let (cache_status, status) = match &result {
            Ok(assertion) => (assertion.cache_status.as_str(), "success"),
            Err(_) => (CacheStatus::Miss.as_str(), "error"),
        };
        tracing::Span::current().record("cache_status", cache_status);
        record_token_issuance(cache_status, status, start.elapsed());

        result
    }

    fn issue_inner(&self, subject: &str, now: DateTime<Utc>) -> Result<Assertion, IssuerError> {
        if subject.trim().is_empty() {
            return Err(IssuerError::InvalidInput("Missing DID".to_string()));
        }

        let timestamp = now.timestamp();
        let window = TimeWindow::containing_timestamp(timestamp);
        tracing::Span::current().record("window_start", window.start());

        if let Some(cached) = self.cache.get(subject, timestamp) {
            tracing::debug!(target: "issuer.token", "Assertion cache hit");
            return Ok(Assertion {
                token: cached.token,
                issued_at: window.start(),
                expires_at: window.expires_at(),
                cache_status: CacheStatus::Hit,
            });
        }

        let claims = AssertionClaims::new(subject.to_string(), window.start(), window.expires_at());
        let token = self.signing_key.sign_assertion(&claims)?;

        let outcome = self.cache.insert(
            subject,
            CachedAssertion {
                token: token.clone(),
                window,
            },
        );
        match outcome {
            InsertOutcome::Stored => {
                set_assertion_cache_entries(self.cache.len());
            }
            InsertOutcome::StaleWindow => {
                tracing::debug!(target: "issuer.token", "Issued for an older window, not cached");
            }
            InsertOutcome::AtCapacity => {
                tracing::warn!(
                    target: "issuer.token",
                    capacity = self.cache.capacity(),
                    "Assertion cache full for current window, not cached"
                );
            }
        }

        tracing::info!(target: "issuer.token", "Assertion issued");

        Ok(Assertion {
            token,
            issued_at: claims.iat,
            expires_at: claims.exp,
            cache_status: CacheStatus::Miss,
        })
    }
}
