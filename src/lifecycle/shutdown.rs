//! Shutdown coordination for the gateway.
//!
//! A single [`Shutdown`] is owned by whoever decides when the gateway stops
//! (the OS signal task in production, the test harness in tests). The
//! listener holds a [`ShutdownSignal`] and stops accepting once it resolves;
//! spliced WebSocket sessions are not tracked and end with their sockets.
//!
//! The trigger latches: a signal taken after the trigger resolves at once.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::lifecycle::signals::shutdown_signal;

/// Owner side of the gateway stop switch.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// A future-like handle for the listener to wait on.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Stop the gateway. Repeated calls are no-ops.
    pub fn trigger(&self) {
        let already = self.tx.send_replace(true);
        if !already {
            tracing::info!(listeners = self.tx.receiver_count(), "Gateway shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Trigger on SIGINT or SIGTERM.
    pub fn trigger_on_os_signal(&self) -> JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.trigger();
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener side of [`Shutdown`].
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once the gateway is told to stop.
    ///
    /// Dropping every [`Shutdown`] without triggering leaves the listener
    /// running.
    pub async fn triggered(mut self) {
        if self.rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn trigger_releases_every_listener() {
        let shutdown = Shutdown::new();
        let plain = tokio::spawn(shutdown.signal().triggered());
        let tls = tokio::spawn(shutdown.signal().triggered());

        shutdown.clone().trigger();

        tokio::time::timeout(Duration::from_secs(1), async {
            plain.await.unwrap();
            tls.await.unwrap();
        })
        .await
        .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn signal_taken_after_trigger_resolves_immediately() {
        let shutdown = Shutdown::default();
        shutdown.trigger();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_millis(100), shutdown.signal().triggered())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_coordinator_keeps_listener_running() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        drop(shutdown);

        let waited = tokio::time::timeout(Duration::from_millis(50), signal.triggered()).await;
        assert!(waited.is_err());
    }
}
