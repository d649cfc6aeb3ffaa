//! # Shutdown Coordination
//!
//! One cancellation token shared by the consumer loop and the observability
//! server. Triggering is idempotent: the first reason wins and later triggers,
//! including repeated signals, are no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    triggered: AtomicBool,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `true` only for the call that actually
    /// cancelled the token.
    pub fn trigger(&self, reason: &str) -> bool {
        if self.triggered.swap(true, Ordering::SeqCst) {
            debug!(reason = reason, "Shutdown already in progress");
            return false;
        }
        info!(reason = reason, "Shutdown requested");
        self.token.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Clone of the shared token observed by long-running tasks
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger shutdown on Ctrl+C or SIGTERM.
    ///
    /// Keeps listening after the first signal so repeats are absorbed instead
    /// of falling through to the default handler.
    pub async fn listen_for_signals(self: Arc<Self>) {
        #[cfg(unix)]
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                return;
            }
        };

        loop {
            #[cfg(unix)]
            let reason = tokio::select! {
                result = signal::ctrl_c() => match result {
                    Ok(()) => "SIGINT",
                    Err(e) => {
                        error!(error = %e, "Failed to install Ctrl+C handler");
                        return;
                    }
                },
                _ = terminate.recv() => "SIGTERM",
            };

            #[cfg(not(unix))]
            let reason = match signal::ctrl_c().await {
                Ok(()) => "SIGINT",
                Err(e) => {
                    error!(error = %e, "Failed to install Ctrl+C handler");
                    return;
                }
            };

            self.trigger(reason);
        }
    }
}
