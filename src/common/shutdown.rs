//! Graceful shutdown coordinator.
//!
//! Used to cancel an in-flight execution pass: the driver checks the
//! terminated flag before each worker, and hosts may await `wait` to be
//! notified when a pass is aborted.

use tokio::sync::watch;

pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            sender: tx,
        }
    }

    /// Signal shutdown to all watchers. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
    }

    /// Whether shutdown has been signaled.
    pub fn is_terminated(&self) -> bool {
        *self.sender.borrow()
    }

    /// Wait until shutdown is signaled.
    pub async fn wait(&self) {
        let mut rx = self.sender.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
