//! Shutdown signalling for the HTTP server.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) flip a watch channel that the
//! server and any background task can wait on.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Owns the shutdown channel and the OS signal listener.
pub struct SignalHandler {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Spawns the OS signal listener task.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!(error = %e, "failed to install signal handlers, using Ctrl+C only");
                        if tokio::signal::ctrl_c().await.is_ok() {
                            info!("received Ctrl+C, shutting down");
                            let _ = tx.send(true);
                        }
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("received SIGINT, shutting down"),
            }
            let _ = tx.send(true);
            debug!("signal listener stopped");
        });
    }

    /// Spawns the Ctrl+C listener task.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let tx = self.tx.clone();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl+C, shutting down");
                let _ = tx.send(true);
            }
        });
    }

    /// Returns a handle for triggering or awaiting shutdown.
    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

/// Cloneable access to the shutdown channel.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownHandle {
    /// Requests shutdown.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Returns true once shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when shutdown is requested (or the sender is gone).
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        // An error means every sender was dropped; treat that as shutdown.
        let _ = rx.wait_for(|down| *down).await;
    }
}
