//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the outgoing URL and its tenant placeholder
//! - Require credentials for both directions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}


pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // The placeholder is not a legal host character, so check the URL with
    // a stand-in segment.
    let sample = config
        .outgoing
        .url
        .replace(config.multi_delimiter, "tenant");
    match Url::parse(&sample) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "outgoing.url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("outgoing.url", e.to_string())),
    }

    if config.multi_tenant && !config.outgoing.url.contains(config.multi_delimiter) {
        errors.push(ValidationError::new(
            "outgoing.url",
            format!(
                "multi-tenant mode requires '{}' in the URL",
                config.multi_delimiter
            ),
        ));
    }

    if config.incoming.secret.is_none() && config.incoming.token.is_none() {
        errors.push(ValidationError::new("incoming", "secret or token is required"));
    }

    if config.outgoing.secret.is_none() && config.outgoing.token.is_none() {
        errors.push(ValidationError::new("outgoing", "secret or token is required"));
    }

    if config.outgoing.max_requests_per_session == Some(0) {
        errors.push(ValidationError::new(
            "outgoing.max_requests_per_session",
            "must be greater than zero",
        ));
    }

    if config.outgoing.secret.is_some() && config.outgoing.expiry_secs == 0 {
        errors.push(ValidationError::new(
            "outgoing.expiry_secs",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
