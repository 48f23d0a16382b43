//! Shutdown Coordination
//!
//! Signal handling for the long-running listener host. The first interrupt
//! or terminate signal requests a graceful shutdown; a second one exits
//! immediately.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the application
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let coordinator = Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        };
        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Run a future with signal handlers installed
    ///
    /// The future receives the shutdown receiver and decides itself when to
    /// return. Must be called within a tokio runtime.
    pub async fn guard<F, Fut, R, E>(future_fn: F) -> Result<R, E>
    where
        F: FnOnce(broadcast::Receiver<()>) -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
    {
        let (coordinator, shutdown_rx) = Self::new();
        setup_signal_handlers(
            coordinator.shutdown_tx.clone(),
            Arc::clone(&coordinator.shutdown_requested),
        );
        future_fn(shutdown_rx).await
    }
}

fn notify(
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_requested: &AtomicBool,
    signal_count: &AtomicUsize,
) {
    let previous = signal_count.fetch_add(1, Ordering::AcqRel);
    shutdown_requested.store(true, Ordering::Release);
    let _ = shutdown_tx.send(());
    if previous >= 1 {
        log::warn!("Second shutdown signal received; exiting");
        std::process::exit(130);
    }
}

fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>, shutdown_requested: Arc<AtomicBool>) {
    let signal_count = Arc::new(AtomicUsize::new(0));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        for kind in [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
        ] {
            let tx = shutdown_tx.clone();
            let requested = Arc::clone(&shutdown_requested);
            let counter = Arc::clone(&signal_count);
            tokio::spawn(async move {
                if let Ok(mut sig) = signal(kind) {
                    while sig.recv().await.is_some() {
                        notify(&tx, &requested, &counter);
                    }
                }
            });
        }
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                notify(&shutdown_tx, &shutdown_requested, &signal_count);
            }
        });
    }
}
