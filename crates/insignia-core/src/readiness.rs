//! Roster readiness latch
//!
//! The roster becomes able to answer role queries some time after the badge
//! session starts. `Readiness` is a one-way latch: once marked ready it stays
//! ready, and any number of observers can poll it or await it.

use tokio::sync::watch;

/// Observer side of the readiness latch.
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

/// Signalling side of the readiness latch, held by the roster implementation.
#[derive(Debug)]
pub struct ReadinessHandle {
    tx: watch::Sender<bool>,
}

impl Readiness {
    /// Create a latch in the not-ready state.
    pub fn new() -> (ReadinessHandle, Readiness) {
        let (tx, rx) = watch::channel(false);
        (ReadinessHandle { tx }, Readiness { rx })
    }

    /// A latch that is already ready.
    pub fn ready() -> Readiness {
        let (handle, readiness) = Readiness::new();
        handle.mark_ready();
        readiness
    }

    /// Non-blocking check.
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the latch is marked ready.
    ///
    /// Returns immediately if it already is. If the signalling side is dropped
    /// without ever marking ready, this returns `false`.
    pub async fn wait(&self) -> bool {
        let mut rx = self.rx.clone();
        let ready = rx.wait_for(|ready| *ready).await.is_ok();
        ready
    }
}

impl ReadinessHandle {
    /// Mark the latch ready. Idempotent.
    pub fn mark_ready(&self) {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
    }

    /// Current state as seen by the signalling side.
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// A new observer for this latch.
    pub fn subscribe(&self) -> Readiness {
        Readiness {
            rx: self.tx.subscribe(),
        }
    }
}
