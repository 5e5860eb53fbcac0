//! One-shot stop signal for the HTTP listener.

use tokio::sync::watch;

/// Fires once; every [`StopSignal`] taken from it resolves afterwards,
/// including signals taken after the trigger.
#[derive(Debug)]
pub struct Shutdown {
    fired: watch::Sender<bool>,
}

/// Future side of a [`Shutdown`], handed to the listener task.
#[derive(Debug)]
pub struct StopSignal {
    fired: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (fired, _) = watch::channel(false);
        Self { fired }
    }

    pub fn signal(&self) -> StopSignal {
        StopSignal {
            fired: self.fired.subscribe(),
        }
    }

    /// Fire the signal. Returns false if it had already fired.
    pub fn trigger(&self) -> bool {
        self.fired.send_if_modified(|fired| !std::mem::replace(fired, true))
    }

    pub fn is_triggered(&self) -> bool {
        *self.fired.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    /// Resolve once the signal fires or its [`Shutdown`] is dropped.
    pub async fn fired(mut self) {
        let _ = self.fired.wait_for(|fired| *fired).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_resolves_on_trigger() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), signal.fired())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_late_signal_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), shutdown.signal().fired())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_signal_resolves_on_drop() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), signal.fired())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_untriggered_signal_stays_pending() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        let pending = tokio::time::timeout(Duration::from_millis(50), signal.fired()).await;
        assert!(pending.is_err());
    }
}
