// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful close coordination with signal handling.
//!
//! A [`CloseHandle`] is the single entry point for ending a session. The
//! shell's exit command and the signal handler both call
//! [`CloseHandle::request_close`]; the session checks the handle between
//! turn steps and cancels an in-flight generation when it fires.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info};

/// Cloneable request-to-close flag shared by a session and its callers.
#[derive(Debug, Clone, Default)]
pub struct CloseHandle {
    token: CancellationToken,
}

impl CloseHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to close. Safe to call any number of times, from
    /// any task.
    pub fn request_close(&self) {
        if !self.token.is_cancelled() {
            info!("close requested");
        }
        self.token.cancel();
    }

    pub fn is_close_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once a close has been requested.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

/// Installs handlers for SIGINT, SIGTERM, and SIGHUP.
///
/// The first signal received calls [`CloseHandle::request_close`]. The
/// handler task exits once the handle is closed by any route.
pub fn install_signal_handler(handle: CloseHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            let mut sighup =
                signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), closing session");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, closing session");
                }
                _ = sighup.recv() => {
                    info!("received SIGHUP, closing session");
                }
                _ = handle.closed() => {
                    debug!("session closed before any signal");
                    return;
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => {
                    info!("received Ctrl+C, closing session");
                }
                _ = handle.closed() => {
                    debug!("session closed before any signal");
                    return;
                }
            }
        }

        handle.request_close();
        debug!("signal handler completed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_close_is_idempotent() {
        let handle = CloseHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_close_requested());
        clone.request_close();
        clone.request_close();
        assert!(handle.is_close_requested());
    }

    #[tokio::test]
    async fn closed_resolves_after_request() {
        let handle = CloseHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.closed().await });
        handle.request_close();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn signal_handler_exits_when_closed_elsewhere() {
        let handle = CloseHandle::new();
        let task = install_signal_handler(handle.clone());
        assert!(!handle.is_close_requested());
        handle.request_close();
        task.await.unwrap();
    }
}
