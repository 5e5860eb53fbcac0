//! Connection state and lifecycle transitions.

/// Whether the bridge accepts requests and sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Outcome of a `connect()` or `disconnect()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Connected,
    AlreadyConnected,
    Disconnected,
    AlreadyDisconnected,
}

impl Transition {
    /// True when the call changed the state.
    pub fn changed(&self) -> bool {
        matches!(self, Transition::Connected | Transition::Disconnected)
    }
}
