//! Memoized node configuration learned through ILDCP.
//!
//! Concurrent first callers may each run the round-trip; the last store
//! wins. Both results describe the same node, so no single-flight guard is
//! used.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use super::handler::HandlerSlot;
use crate::error::BridgeError;
use crate::packet::{IldcpRequest, IldcpResponse, PacketError, PacketType, Reject};

#[derive(Debug, Default)]
pub struct DiscoveryCache {
    cached: ArcSwapOption<IldcpResponse>,
}

impl DiscoveryCache {
    pub fn new(preset: Option<IldcpResponse>) -> Self {
        Self {
            cached: ArcSwapOption::new(preset.map(Arc::new)),
        }
    }

    pub fn get(&self) -> Option<Arc<IldcpResponse>> {
        self.cached.load_full()
    }

    /// Cached configuration, or a `peer.config` round-trip through the
    /// registered handler.
    pub async fn fetch(&self, handlers: &HandlerSlot) -> Result<Arc<IldcpResponse>, BridgeError> {
        if let Some(cached) = self.get() {
            return Ok(cached);
        }

        let handler = handlers
            .current()
            .ok_or(BridgeError::ConfigurationUnavailable)?;

        tracing::debug!("Requesting node configuration via ILDCP");
        let reply = handler.handle_data(IldcpRequest::new().to_bytes()).await?;

        let response = match PacketType::of(&reply)? {
            PacketType::Fulfill => IldcpResponse::from_bytes(&reply)?,
            PacketType::Reject => {
                let reject = Reject::from_bytes(&reply)?;
                tracing::warn!(code = %reject.code, message = %reject.message, "ILDCP request rejected");
                return Err(BridgeError::DiscoveryRejected {
                    code: reject.code,
                    message: reject.message,
                });
            }
            actual => {
                return Err(PacketError::WrongType {
                    expected: PacketType::Fulfill,
                    actual,
                }
                .into())
            }
        };

        tracing::info!(
            client_address = %response.client_address,
            asset_code = %response.asset_code,
            asset_scale = response.asset_scale,
            "Discovered node configuration"
        );

        let response = Arc::new(response);
        self.cached.store(Some(response.clone()));
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::handler::HandlerError;
    use crate::packet::{Prepare, ILDCP_DESTINATION};
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node_config() -> IldcpResponse {
        IldcpResponse {
            client_address: "g.node1".to_string(),
            asset_scale: 9,
            asset_code: "XRP".to_string(),
        }
    }

    #[tokio::test]
    async fn test_preset_needs_no_handler() {
        let cache = DiscoveryCache::new(Some(node_config()));
        let handlers = HandlerSlot::default();
        let config = cache.fetch(&handlers).await.unwrap();
        assert_eq!(config.client_address, "g.node1");
    }

    #[tokio::test]
    async fn test_missing_handler_fails_loudly() {
        let cache = DiscoveryCache::new(None);
        let err = cache.fetch(&HandlerSlot::default()).await.unwrap_err();
        assert!(matches!(err, BridgeError::ConfigurationUnavailable));
    }

    #[tokio::test]
    async fn test_round_trip_happens_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handlers = HandlerSlot::default();
        let counter = calls.clone();
        handlers.set(Box::new(move |data: Bytes| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let prepare = Prepare::from_bytes(&data).map_err(|e| HandlerError::new(e.to_string()))?;
                assert_eq!(prepare.destination, ILDCP_DESTINATION);
                Ok::<_, HandlerError>(node_config().to_bytes())
            }
        }));

        let cache = DiscoveryCache::new(None);
        let first = cache.fetch(&handlers).await.unwrap();
        let second = cache.fetch(&handlers).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reject_reported() {
        let handlers = HandlerSlot::default();
        handlers.set(Box::new(|_: Bytes| async {
            Ok::<_, HandlerError>(
                Reject {
                    code: "F02".to_string(),
                    triggered_by: "g.parent".to_string(),
                    message: "no route".to_string(),
                    data: Bytes::new(),
                }
                .to_bytes(),
            )
        }));

        let cache = DiscoveryCache::new(None);
        let err = cache.fetch(&handlers).await.unwrap_err();
        assert!(matches!(err, BridgeError::DiscoveryRejected { ref code, .. } if code == "F02"));
        assert!(cache.get().is_none());
    }
}
