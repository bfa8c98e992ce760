// src/exec/interrupt.rs

//! External interruption of a running build.

use tokio::sync::watch;
use tracing::{debug, warn};

/// Receiving side, held by the executor.
///
/// Checked before each node and raced against the running action.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Sending side; `trigger` interrupts every executor holding a paired
/// [`Interrupt`].
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    pub fn trigger(&self) {
        // No receivers left means nothing is running; nothing to do.
        let _ = self.tx.send(true);
    }
}

impl Interrupt {
    pub fn new() -> (InterruptHandle, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptHandle { tx }, Interrupt { rx })
    }

    /// An interrupt that never fires.
    pub fn never() -> Interrupt {
        let (_handle, interrupt) = Interrupt::new();
        interrupt
    }

    /// Interrupt wired to Ctrl-C. Must be called inside a tokio runtime.
    pub fn ctrl_c() -> Interrupt {
        let (handle, interrupt) = Interrupt::new();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                // Keep the sender alive so the interrupt simply never fires.
                std::future::pending::<()>().await;
            }
            debug!("Ctrl+C received; interrupting build");
            handle.trigger();
        });
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt fires; pends forever if it never can.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone without firing.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Interrupt::never()
    }
}
