//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! connect():
//!     Disconnected → bind listener → Connected (published on watch channel)
//!
//! disconnect():
//!     Connected → close HTTP/2 sessions → stop listener (drain, then abort)
//!               → Disconnected (published on watch channel)
//! ```
//!
//! # Design Decisions
//! - Both transitions are idempotent and report what they did
//! - Listener stop has a deadline: forced abort after the grace period
//! - Observers subscribe to state instead of a global event bus

pub mod shutdown;
pub mod state;

pub use shutdown::{Shutdown, StopSignal};
pub use state::{ConnectionState, Transition};
