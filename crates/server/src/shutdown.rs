//! Process shutdown on SIGINT/SIGTERM.
//!
//! Signal listeners only enqueue a [`ShutdownReason`]. The
//! [`ShutdownCoordinator`] drains the queue, stops the broadcast service and
//! reports the exit code; it does not wait for the broadcast loop to finish.

use std::{io, sync::Arc};

use discovery::BroadcastService;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownOutcome {
    pub reason: ShutdownReason,
    pub exit_code: u8,
}

#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<ShutdownReason>,
}

impl ShutdownHandle {
    /// Queues a shutdown request. Extra requests while one is pending are dropped.
    pub fn request(&self, reason: ShutdownReason) {
        let _ = self.tx.try_send(reason);
    }
}

pub struct ShutdownCoordinator {
    tx: mpsc::Sender<ShutdownReason>,
    rx: mpsc::Receiver<ShutdownReason>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(4);
        Self { tx, rx }
    }

    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.tx.clone(),
        }
    }

    pub async fn wait(&mut self) -> ShutdownReason {
        match self.rx.recv().await {
            Some(reason) => reason,
            // Unreachable while `self.tx` is alive.
            None => std::future::pending().await,
        }
    }

    /// Waits for the first request, then asks the broadcast service to stop.
    pub async fn run(mut self, broadcast: Arc<Mutex<BroadcastService>>) -> ShutdownOutcome {
        let reason = self.wait().await;
        info!(?reason, "shutting down services");
        broadcast.lock().await.stop();
        ShutdownOutcome {
            reason,
            exit_code: 0,
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards SIGINT and SIGTERM to `handle` for the life of the process.
#[cfg(unix)]
pub fn listen_for_signals(handle: ShutdownHandle) -> io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let reason = tokio::select! {
                Some(()) = interrupt.recv() => ShutdownReason::Interrupt,
                Some(()) = terminate.recv() => ShutdownReason::Terminate,
                else => break,
            };
            info!(?reason, "shutdown signal received");
            handle.request(reason);
        }
    }))
}

#[cfg(not(unix))]
pub fn listen_for_signals(handle: ShutdownHandle) -> io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            handle.request(ShutdownReason::Interrupt);
        }
    }))
}

#[cfg(test)]
#[path = "tests/shutdown_tests.rs"]
mod tests;
