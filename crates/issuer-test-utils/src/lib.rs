//! # Issuer Test Utilities
//!
//! Shared test utilities for the DID assertion issuer.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (seeded P-256 keys, a fixed OpenSSL key)
//! - Test data builders (TestAssertionBuilder, payload tampering)
//! - Server test harness (TestIssuerServer for E2E tests)
//! - Fixed test IDs (DIDs, key IDs, instants)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use issuer_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestIssuerServer::spawn(1).await?;
//!     let assertion = server
//!         .state()
//!         .issuer
//!         .issue(TEST_DID_ALICE, instant(EXAMPLE_INSTANT))?;
//!
//!     assertion
//!         .token
//!         .assert_valid_es256_jwt()
//!         .assert_for_subject(TEST_DID_ALICE)
//!         .assert_window(EXAMPLE_WINDOW_START);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
