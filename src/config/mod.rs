//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → shared via Arc with the bridge, sender and auth gate
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the bridge is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BridgeConfig;
pub use schema::HttpVersion;
pub use schema::IncomingConfig;
pub use schema::ListenerConfig;
pub use schema::OutgoingConfig;
