//! Graceful shutdown coordination.
//!
//! The run loop, the gossip task, the cache refresher, and the RPC server
//! all hold a receiver from the same `tokio::sync::broadcast` channel and
//! `select!` on it next to their work. One send drains them all.

use tokio::signal;
use tokio::sync::broadcast;

/// Fans a single shutdown signal out to every subsystem.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver notified on shutdown. Each subsystem takes its own.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown without an OS signal.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Block until SIGINT or SIGTERM arrives, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "could not install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
