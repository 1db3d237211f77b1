//! Cooperative cancellation shared between the tick thread and async tasks.

use std::sync::Arc;

use tokio::sync::watch;

/// One-way cancellation flag. Clones share the flag.
///
/// Readable synchronously from the tick thread and awaitable from tasks.
#[derive(Clone, Debug)]
pub struct ShutdownToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// A token that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Fires the token. Idempotent.
    pub fn cancel(&self) {
        let _ = self.sender.send_replace(true);
    }

    /// Returns true once fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes once the token has fired.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}
