//! # Correlation Bridge
//!
//! Pairs asynchronous requests with their results by a [`CallbackId`].
//!
//! ```text
//! network task                     tick thread
//!   register_future() ─▶ id
//!   emit(event{id}) ─────────────▶ manager handles event
//!   await rx        ◀───────────── resolve(id, result)
//! ```
//!
//! Registrations live in a sharded concurrent map, so registering and
//! resolving on different ids do not contend. Each registration is consumed
//! at most once. Resolving an unknown or
//! already-resolved id is a no-op. Registrations do not expire; a caller
//! that gives up simply never reads the result.

use std::fmt;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Opaque request correlation id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub Uuid);

impl CallbackId {
    /// Fresh random id.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type Continuation<T> = Box<dyn FnOnce(T) + Send + Sync>;

/// Pending-request table.
pub struct CorrelationBridge<T> {
    pending: DashMap<CallbackId, Continuation<T>>,
}

impl<T: Send + 'static> CorrelationBridge<T> {
    /// Creates an empty bridge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    /// Stores `continuation` under a fresh id.
    pub fn register(&self, continuation: impl FnOnce(T) + Send + Sync + 'static) -> CallbackId {
        let continuation: Continuation<T> = Box::new(continuation);
        loop {
            let id = CallbackId::new_v4();
            if let Entry::Vacant(slot) = self.pending.entry(id) {
                slot.insert(continuation);
                return id;
            }
        }
    }

    /// Registers a one-shot channel as the continuation.
    ///
    /// Dropping the receiver abandons the request; a later resolve still
    /// consumes the registration.
    pub fn register_future(&self) -> (CallbackId, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let id = self.register(move |value| {
            // The caller may have given up.
            let _ = tx.send(value);
        });
        (id, rx)
    }

    /// Removes the continuation for `id` and runs it with `result`.
    ///
    /// Returns `false` when nothing was registered.
    pub fn resolve(&self, id: CallbackId, result: T) -> bool {
        // The shard lock is released before the continuation runs.
        let continuation = self.pending.remove(&id);
        match continuation {
            Some((_, continuation)) => {
                continuation(result);
                true
            }
            None => {
                tracing::trace!(callback_id = %id, "resolve without registration");
                false
            }
        }
    }

    /// Drops a registration without running it.
    pub fn unregister(&self, id: CallbackId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Outstanding registrations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl<T: Send + 'static> Default for CorrelationBridge<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CorrelationBridge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationBridge")
            .field("pending", &self.pending.len())
            .finish()
    }
}
