//! Common utilities and types shared across the DID token issuer components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for ES256 assertion claims, JWKS wire types and verification
pub mod jwt;
