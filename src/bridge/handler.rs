//! Packet and money handler registration.

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a registered data handler.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Processes a raw inbound packet and returns the raw response packet.
///
/// Implemented for any `Fn(Bytes) -> impl Future<Output = Result<Bytes, HandlerError>>`.
pub trait DataHandler: Send + Sync {
    fn handle_data(&self, data: Bytes) -> BoxFuture<'static, Result<Bytes, HandlerError>>;
}

impl<F, Fut> DataHandler for F
where
    F: Fn(Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bytes, HandlerError>> + Send + 'static,
{
    fn handle_data(&self, data: Bytes) -> BoxFuture<'static, Result<Bytes, HandlerError>> {
        self(data).boxed()
    }
}

/// Settlement callback. The bridge accepts one but never invokes it.
pub trait MoneyHandler: Send + Sync {
    fn handle_money(&self, amount: u64) -> BoxFuture<'static, ()>;
}

impl<F, Fut> MoneyHandler for F
where
    F: Fn(u64) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn handle_money(&self, amount: u64) -> BoxFuture<'static, ()> {
        self(amount).boxed()
    }
}

/// Holds at most one data handler; the last registration wins.
#[derive(Default)]
pub struct HandlerSlot {
    inner: ArcSwapOption<Box<dyn DataHandler>>,
}

impl HandlerSlot {
    pub fn set(&self, handler: Box<dyn DataHandler>) {
        self.inner.store(Some(Arc::new(handler)));
    }

    pub fn clear(&self) {
        self.inner.store(None);
    }

    /// Snapshot of the registered handler; stays valid if it is replaced.
    pub fn current(&self) -> Option<Arc<Box<dyn DataHandler>>> {
        self.inner.load_full()
    }

    pub fn is_registered(&self) -> bool {
        self.inner.load().is_some()
    }
}

impl std::fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("registered", &self.is_registered())
            .finish()
    }
}
