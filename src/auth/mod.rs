//! Bearer-token authentication in both directions.
//!
//! # Data Flow
//! ```text
//! Inbound:  Authorization header → AuthGate::verify_incoming → bool
//! Outbound: AuthGate::produce_outgoing → "Bearer <token>" header value
//! ```
//!
//! # Design Decisions
//! - The bridge only sees the two operations of [`AuthGate`]
//! - Verification never errors; anything unverifiable is simply rejected

pub mod token;

use thiserror::Error;

pub use token::TokenAuth;

/// Prefix of the authorization header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Capability pair consumed by the bridge.
pub trait AuthGate: Send + Sync {
    /// Check an inbound `Authorization` header value.
    fn verify_incoming(&self, header: Option<&str>) -> bool;

    /// Produce the token for an outbound request (without the `Bearer ` prefix).
    fn produce_outgoing(&self) -> Result<String, AuthError>;
}

/// Errors while producing outbound credentials.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Neither a static token nor a signing secret is configured.
    #[error("no outgoing secret or token configured")]
    MissingSecret,

    /// Signing key was rejected by the MAC implementation.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Strip a case-insensitive `Bearer ` prefix.
pub fn strip_bearer(header: &str) -> Option<&str> {
    let prefix = header.get(..BEARER_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        Some(header[BEARER_PREFIX.len()..].trim())
    } else {
        None
    }
}
