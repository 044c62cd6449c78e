//! DID assertion issuer.
//!
//! Issues ES256 JWTs binding a decentralized identifier to a clock-aligned
//! one-hour window, and publishes the matching public key as a JWKS.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Signing key loading, public key derivation, ES256 signing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Content-Security-Policy and HTTP metrics layers
//! - `models` - Time windows, assertions, request/response bodies
//! - `observability` - Metrics and log correlation helpers
//! - `routes` - Router and application state
//! - `services` - Token issuer, assertion cache, key publisher

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
