//! Graceful shutdown with signal handling

use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

/// Shutdown signal broadcaster
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<broadcast::Sender<()>>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to shutdown notifications
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Trigger shutdown
    pub fn trigger(&self) {
        let _ = self.sender.send(());
        tracing::info!("Shutdown signal triggered");
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for SIGINT or SIGTERM, then triggers the shutdown signal
#[derive(Debug)]
pub struct SignalHandler {
    signal: ShutdownSignal,
}

impl SignalHandler {
    /// Create a new signal handler
    pub fn new(signal: ShutdownSignal) -> Self {
        Self { signal }
    }

    /// Listen until the first OS signal
    pub async fn run(self) {
        #[cfg(unix)]
        {
            use signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                        _ = signal::ctrl_c() => tracing::info!("Received SIGINT"),
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "SIGTERM handler unavailable, waiting for Ctrl+C");
                    if let Err(err) = signal::ctrl_c().await {
                        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
                        return;
                    }
                    tracing::info!("Received SIGINT");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!(error = %err, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Received Ctrl+C");
        }

        self.signal.trigger();
    }
}
