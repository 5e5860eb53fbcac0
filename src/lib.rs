//! ILP-over-HTTP bridge library.
//!
//! Carries Interledger packets between a local packet handler and a peer
//! reachable over HTTP/1.1 or HTTP/2.

pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod packet;
pub mod transport;

pub use bridge::handler::{DataHandler, HandlerError, MoneyHandler};
pub use bridge::HttpBridge;
pub use config::schema::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use lifecycle::{ConnectionState, Transition};
