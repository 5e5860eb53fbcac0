//! The ILP-over-HTTP bridge.
//!
//! # Data Flow
//! ```text
//! Peer POST → http::server → AuthGate → (DiscoveryCache | DataHandler) → HTTP response
//!
//! send_data(packet)
//!     → AuthGate::produce_outgoing
//!     → sender.rs (URL resolution, may consult DiscoveryCache)
//!     → TransportPool::fetch
//!     → response body
//! ```
//!
//! # Design Decisions
//! - All shared state lives in one `BridgeContext` owned by the bridge
//! - Handler slot and discovery cache are lock-free (`arc-swap`)
//! - Connection state is a watch channel so observers can follow transitions
//! - Settlement is not carried over HTTP; the money operations are no-ops

pub mod discovery;
pub mod handler;
pub mod sender;

use axum::http::HeaderValue;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::auth::{AuthGate, TokenAuth};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::http::ServerHandle;
use crate::lifecycle::{ConnectionState, Transition};
use crate::packet::IldcpResponse;
use crate::transport::TransportPool;

use self::discovery::DiscoveryCache;
use self::handler::{DataHandler, HandlerSlot, MoneyHandler};

/// State shared between the bridge, its listener and outbound sends.
pub struct BridgeContext {
    pub(crate) config: Arc<BridgeConfig>,
    pub(crate) peer_name: HeaderValue,
    pub(crate) auth: Arc<dyn AuthGate>,
    pub(crate) transport: TransportPool,
    pub(crate) handlers: HandlerSlot,
    pub(crate) discovery: DiscoveryCache,
    pub(crate) state: watch::Sender<ConnectionState>,
}

impl BridgeContext {
    pub fn is_connected(&self) -> bool {
        *self.state.borrow() == ConnectionState::Connected
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}

/// Carries ILP packets between a local handler and an HTTP peer.
pub struct HttpBridge {
    context: Arc<BridgeContext>,
    /// Running listener; the mutex also serializes connect and disconnect.
    server: Mutex<Option<ServerHandle>>,
}

impl HttpBridge {
    /// Create a bridge authenticating with the configured tokens and secrets.
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let auth = Arc::new(TokenAuth::new(&config.incoming, &config.outgoing));
        Self::with_auth(config, auth)
    }

    /// Create a bridge with a custom [`AuthGate`].
    pub fn with_auth(config: BridgeConfig, auth: Arc<dyn AuthGate>) -> Result<Self, BridgeError> {
        let peer_name = HeaderValue::from_str(&config.node_name())
            .map_err(|_| BridgeError::InvalidHeader("ILP-Peer-Name"))?;
        let transport = TransportPool::from_config(&config.outgoing)?;
        let discovery = DiscoveryCache::new(config.ildcp.clone());
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        let context = BridgeContext {
            config: Arc::new(config),
            peer_name,
            auth,
            transport,
            handlers: HandlerSlot::default(),
            discovery,
            state,
        };

        Ok(Self {
            context: Arc::new(context),
            server: Mutex::new(None),
        })
    }

    /// Start the listener. A no-op when already connected.
    pub async fn connect(&self) -> Result<Transition, BridgeError> {
        let mut server = self.server.lock().await;
        if server.is_some() {
            return Ok(Transition::AlreadyConnected);
        }

        let port = self.context.config.listener.port;
        let handle = ServerHandle::start(self.context.clone(), port)
            .await
            .map_err(BridgeError::Listener)?;
        let local_addr = handle.local_addr();
        *server = Some(handle);
        self.context.set_state(ConnectionState::Connected);

        tracing::info!(
            address = %local_addr,
            name = %self.context.config.node_name(),
            multi_tenant = self.context.config.multi_tenant,
            "Bridge connected"
        );
        Ok(Transition::Connected)
    }

    /// Close every HTTP/2 session and stop the listener. A no-op when
    /// already disconnected.
    pub async fn disconnect(&self) -> Transition {
        let mut server = self.server.lock().await;
        let Some(handle) = server.take() else {
            return Transition::AlreadyDisconnected;
        };

        // Sends and inbound requests racing the drain must already see Disconnected.
        self.context.set_state(ConnectionState::Disconnected);
        let mut sessions_closed = self.context.transport.close_sessions();
        handle.stop().await;
        // A send that passed its check before the flip may have opened one.
        sessions_closed += self.context.transport.close_sessions();

        tracing::info!(sessions_closed, "Bridge disconnected");
        Transition::Disconnected
    }

    pub fn is_connected(&self) -> bool {
        self.context.is_connected()
    }

    /// Follow connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.context.state.subscribe()
    }

    /// Address the listener is bound to while connected.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().await.as_ref().map(ServerHandle::local_addr)
    }

    /// Send a packet to the peer and return its response packet.
    pub async fn send_data(&self, data: Bytes) -> Result<Bytes, BridgeError> {
        sender::send_data(&self.context, data).await
    }

    /// Node configuration, discovered through the data handler on first use.
    pub async fn discover(&self) -> Result<Arc<IldcpResponse>, BridgeError> {
        self.context.discovery.fetch(&self.context.handlers).await
    }

    pub fn register_data_handler<H>(&self, handler: H)
    where
        H: DataHandler + 'static,
    {
        if self.context.handlers.is_registered() {
            tracing::debug!("Replacing registered data handler");
        }
        self.context.handlers.set(Box::new(handler));
    }

    pub fn deregister_data_handler(&self) {
        self.context.handlers.clear();
    }

    pub fn has_data_handler(&self) -> bool {
        self.context.handlers.is_registered()
    }

    /// Accepted for interface compatibility; never invoked.
    pub fn register_money_handler<H>(&self, _handler: H)
    where
        H: MoneyHandler + 'static,
    {
    }

    pub fn deregister_money_handler(&self) {}

    /// Settlement is not carried by this transport.
    pub async fn send_money(&self, _amount: u64) {}

    pub fn config(&self) -> &BridgeConfig {
        &self.context.config
    }

    pub fn transport(&self) -> &TransportPool {
        &self.context.transport
    }

    /// Router serving this bridge's inbound requests.
    pub fn router(&self) -> axum::Router {
        crate::http::build_router(self.context.clone())
    }
}

impl std::fmt::Debug for HttpBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBridge")
            .field("name", &self.context.config.node_name())
            .field("connected", &self.is_connected())
            .field("handler", &self.context.handlers)
            .finish()
    }
}
