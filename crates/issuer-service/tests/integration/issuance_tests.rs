//! Token issuance: determinism, window rollover and expiry boundaries.

use common::jwt::{verify_assertion, JwtValidationError};
use common::secret::SecretString;
use issuer_service::crypto::SigningKey;
use issuer_service::models::CacheStatus;
use issuer_service::services::key_management_service::KeyPublisher;
use issuer_service::services::token_service::TokenIssuer;
use issuer_test_utils::*;
use std::sync::Arc;

fn issuer_and_publisher(seed: u8) -> Result<(TokenIssuer, KeyPublisher), anyhow::Error> {
    let key = Arc::new(SigningKey::from_pkcs8_pem(
        &test_signing_key_secret(seed)?,
        TEST_KEY_ID_1,
    )?);
    let publisher = KeyPublisher::new(&key)?;
    Ok((TokenIssuer::new(key, 1000), publisher))
}

// ============================================================================
// End-to-end example
// ============================================================================

#[test]
fn test_example_issue_and_verify() -> Result<(), anyhow::Error> {
    let (issuer, publisher) = issuer_and_publisher(1)?;

    let assertion = issuer.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?;

    assert_eq!(assertion.issued_at, EXAMPLE_WINDOW_START);
    assert_eq!(assertion.expires_at, EXAMPLE_EXPIRY);
    assertion
        .token
        .assert_valid_es256_jwt()
        .assert_for_subject(TEST_DID_ALICE)
        .assert_signed_by(TEST_KEY_ID_1)
        .assert_window(EXAMPLE_WINDOW_START)
        .assert_verifies_with(&publisher.publish(), EXAMPLE_INSTANT);

    // JWKS coordinates are the key's public point
    let jwks = publisher.publish();
    let jwk = jwks.find_key(TEST_KEY_ID_1).expect("published key");
    assert_eq!(jwk.coordinates()?, test_public_point(1)?);

    Ok(())
}

#[test]
fn test_openssl_key_publishes_known_coordinates() -> Result<(), anyhow::Error> {
    let key = SigningKey::from_pkcs8_pem(
        &SecretString::from(OPENSSL_P256_PKCS8_PEM),
        TEST_KEY_ID_1,
    )?;
    let jwks = KeyPublisher::new(&key)?.publish();

    assert_eq!(jwks.keys.len(), 1);
    assert_eq!(jwks.keys[0].x, OPENSSL_P256_X);
    assert_eq!(jwks.keys[0].y, OPENSSL_P256_Y);

    Ok(())
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_hour_returns_identical_token() -> Result<(), anyhow::Error> {
    let (issuer, _) = issuer_and_publisher(1)?;

    let first = issuer.issue(TEST_DID_ALICE, instant(EXAMPLE_WINDOW_START))?;
    let middle = issuer.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?;
    let last = issuer.issue(TEST_DID_ALICE, instant(EXAMPLE_EXPIRY - 1))?;

    assert_eq!(first.token, middle.token);
    assert_eq!(first.token, last.token);
    assert_eq!(middle.cache_status, CacheStatus::Hit);

    Ok(())
}

#[test]
fn test_independent_issuers_produce_identical_tokens() -> Result<(), anyhow::Error> {
    let (issuer_a, _) = issuer_and_publisher(1)?;
    let (issuer_b, _) = issuer_and_publisher(1)?;

    let a = issuer_a.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?;
    let b = issuer_b.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT + 17))?;

    assert_eq!(a.cache_status, CacheStatus::Miss);
    assert_eq!(b.cache_status, CacheStatus::Miss);
    assert_eq!(a.token, b.token);

    Ok(())
}

#[test]
fn test_escaped_pem_issues_identical_tokens() -> Result<(), anyhow::Error> {
    let pem = test_signing_key_pem(2)?;
    let raw = SigningKey::from_pkcs8_pem(&SecretString::from(pem.as_str()), TEST_KEY_ID_1)?;
    let escaped = SigningKey::from_pkcs8_pem(
        &SecretString::from(escape_newlines(&pem).as_str()),
        TEST_KEY_ID_1,
    )?;

    let a = TokenIssuer::new(Arc::new(raw), 10).issue(TEST_DID_BOB, instant(EXAMPLE_INSTANT))?;
    let b =
        TokenIssuer::new(Arc::new(escaped), 10).issue(TEST_DID_BOB, instant(EXAMPLE_INSTANT))?;

    assert_eq!(a.token, b.token);

    Ok(())
}

#[test]
fn test_key_id_changes_token() -> Result<(), anyhow::Error> {
    let secret = test_signing_key_secret(1)?;
    let a = TokenIssuer::new(Arc::new(SigningKey::from_pkcs8_pem(&secret, TEST_KEY_ID_1)?), 10);
    let b = TokenIssuer::new(Arc::new(SigningKey::from_pkcs8_pem(&secret, TEST_KEY_ID_2)?), 10);

    let token_a = a.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?.token;
    let token_b = b.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?.token;

    assert_ne!(token_a, token_b);
    token_b.assert_signed_by(TEST_KEY_ID_2);

    Ok(())
}

// ============================================================================
// Window rollover
// ============================================================================

#[test]
fn test_next_window_issues_fresh_token() -> Result<(), anyhow::Error> {
    let (issuer, publisher) = issuer_and_publisher(1)?;

    let current = issuer.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?;
    let next = issuer.issue(TEST_DID_ALICE, instant(EXAMPLE_EXPIRY))?;

    assert_ne!(current.token, next.token);
    assert_eq!(next.cache_status, CacheStatus::Miss);
    next.token
        .assert_window(EXAMPLE_EXPIRY)
        .assert_verifies_with(&publisher.publish(), EXAMPLE_EXPIRY);

    // The earlier window's entry was purged
    assert_eq!(issuer.cache().len(), 1);

    Ok(())
}

#[test]
fn test_pre_epoch_instant_floors_to_window() -> Result<(), anyhow::Error> {
    let (issuer, _) = issuer_and_publisher(1)?;

    let assertion = issuer.issue(TEST_DID_ALICE, instant(-1))?;

    assert_eq!(assertion.issued_at, -3600);
    assert_eq!(assertion.expires_at, 0);

    Ok(())
}

// ============================================================================
// Expiry boundary
// ============================================================================

#[test]
fn test_expiry_boundary() -> Result<(), anyhow::Error> {
    let (issuer, publisher) = issuer_and_publisher(1)?;
    let jwks = publisher.publish();

    let token = issuer.issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?.token;

    // Valid through the last second of the window
    assert!(verify_assertion(&token, &jwks, EXAMPLE_EXPIRY - 1).is_ok());

    // exp is exclusive
    assert_eq!(
        verify_assertion(&token, &jwks, EXAMPLE_EXPIRY),
        Err(JwtValidationError::Expired)
    );
    assert_eq!(
        verify_assertion(&token, &jwks, EXAMPLE_WINDOW_START + 3601),
        Err(JwtValidationError::Expired)
    );

    Ok(())
}

#[test]
fn test_empty_subject_is_invalid_input() -> Result<(), anyhow::Error> {
    let (issuer, _) = issuer_and_publisher(1)?;

    let result = issuer.issue("", instant(EXAMPLE_INSTANT));

    assert!(matches!(
        result,
        Err(issuer_service::errors::IssuerError::InvalidInput(_))
    ));

    Ok(())
}
