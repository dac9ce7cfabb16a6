use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use eyre::Result;
use tokio::{signal, sync::broadcast};

/// Represents different shutdown reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGTERM or SIGINT received
    Signal,
    /// Requested programmatically, e.g. by a test harness
    Requested,
    /// Shutdown channel closed or lagged
    Force,
}

/// Manages graceful shutdown. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct GracefulShutdown {
    /// Broadcast sender for shutdown signals
    shutdown_tx: broadcast::Sender<ShutdownReason>,
    /// Flag indicating if shutdown has been initiated
    shutdown_initiated: Arc<AtomicBool>,
    /// Maximum time to wait for in-flight requests
    shutdown_timeout: Duration,
}

impl GracefulShutdown {
    /// Create a new GracefulShutdown manager with default 30-second timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a new GracefulShutdown manager with custom timeout
    pub fn with_timeout(shutdown_timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_timeout,
        }
    }

    /// Get a receiver for shutdown signals
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.shutdown_tx.subscribe()
    }

    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Relaxed)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Manually trigger shutdown. Only the first call has an effect.
    pub fn trigger_shutdown(&self, reason: ShutdownReason) -> Result<()> {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            tracing::info!("Shutdown triggered: {:?}", reason);
            let _ = self.shutdown_tx.send(reason);
        } else {
            tracing::warn!("Shutdown already initiated, ignoring {:?}", reason);
        }
        Ok(())
    }

    /// Listen for SIGINT / SIGTERM and trigger shutdown on the first one.
    pub async fn run_signal_handler(&self) -> Result<()> {
        tracing::info!("Signal handler started. Listening for SIGTERM and SIGINT");

        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for SIGINT: {}", e);
                    return Err(e.into());
                }
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            }
            result = Self::wait_for_sigterm() => {
                result?;
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        self.trigger_shutdown(ShutdownReason::Signal)
    }

    #[cfg(unix)]
    async fn wait_for_sigterm() -> Result<()> {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        sigterm.recv().await;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn wait_for_sigterm() -> Result<()> {
        // On non-Unix systems, we only have Ctrl+C
        std::future::pending::<()>().await;
        Ok(())
    }

    /// Create a shutdown token that can be awaited by long-running tasks
    pub fn shutdown_token(&self) -> ShutdownToken {
        ShutdownToken {
            receiver: self.subscribe(),
            shutdown_initiated: self.shutdown_initiated.clone(),
        }
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A token that can be used to check for shutdown signals
pub struct ShutdownToken {
    receiver: broadcast::Receiver<ShutdownReason>,
    shutdown_initiated: Arc<AtomicBool>,
}

impl Clone for ShutdownToken {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.resubscribe(),
            shutdown_initiated: self.shutdown_initiated.clone(),
        }
    }
}

impl ShutdownToken {
    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Relaxed)
    }

    /// Wait for the shutdown signal. Returns at once if shutdown already began.
    pub async fn wait_for_shutdown(mut self) -> ShutdownReason {
        match self.receiver.try_recv() {
            Ok(reason) => return reason,
            Err(broadcast::error::TryRecvError::Empty) if self.is_shutdown_initiated() => {
                return ShutdownReason::Requested;
            }
            Err(broadcast::error::TryRecvError::Empty) => {}
            Err(_) => return ShutdownReason::Force,
        }
        match self.receiver.recv().await {
            Ok(reason) => reason,
            Err(_) => ShutdownReason::Force,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_graceful_shutdown_creation() {
        let shutdown = GracefulShutdown::with_timeout(Duration::from_secs(5));
        assert!(!shutdown.is_shutdown_initiated());
        assert_eq!(shutdown.shutdown_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_manual_trigger_shutdown() {
        let shutdown = GracefulShutdown::new();
        let mut receiver = shutdown.subscribe();

        shutdown.trigger_shutdown(ShutdownReason::Requested).unwrap();
        assert!(shutdown.is_shutdown_initiated());
        assert_eq!(receiver.try_recv().unwrap(), ShutdownReason::Requested);

        // second trigger is ignored
        shutdown.trigger_shutdown(ShutdownReason::Signal).unwrap();
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_token_wakes_on_trigger() {
        let shutdown = GracefulShutdown::new();
        let token = shutdown.shutdown_token();
        let waiter = tokio::spawn(token.wait_for_shutdown());

        shutdown.trigger_shutdown(ShutdownReason::Requested).unwrap();
        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, ShutdownReason::Requested);
    }

    #[tokio::test]
    async fn test_token_created_after_trigger_returns_immediately() {
        let shutdown = GracefulShutdown::new();
        shutdown.trigger_shutdown(ShutdownReason::Requested).unwrap();

        let token = shutdown.shutdown_token();
        assert!(token.is_shutdown_initiated());
        let reason = tokio::time::timeout(Duration::from_secs(1), token.wait_for_shutdown())
            .await
            .unwrap();
        assert_eq!(reason, ShutdownReason::Requested);
    }
}
