//! Inbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, HTTP/1.1 and HTTP/2)
//!     → request.rs (request ID, ILP header names)
//!     → health check / auth / connectivity / body limit
//!     → ILDCP interception (multi-tenant) or registered data handler
//!     → single response per request
//! ```

pub mod request;
pub mod server;

pub use request::{ILP_CONTENT_TYPE, ILP_DESTINATION, ILP_PEER_NAME};
pub use server::{build_router, ServerHandle};
