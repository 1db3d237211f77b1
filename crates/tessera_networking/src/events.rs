//! # World Event Bus
//!
//! Publish/subscribe between network tasks and tick-driven managers.
//!
//! Every subscriber of a kind gets its own crossbeam channel; managers drain
//! theirs once per tick, so handlers always run on the tick thread.
//! Subscribers whose receiver was dropped are pruned on the next emit.

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tessera_core::{TileEdit, WorldPos};

use crate::bridge::CallbackId;
use crate::protocol::ViewportRequest;

/// A viewport request routed to the viewport manager.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportQuery {
    /// The decoded client request.
    pub request: ViewportRequest,
    /// Where to deliver the result.
    pub callback_id: CallbackId,
}

/// Events carried by the bus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WorldEvent {
    /// Build a viewport snapshot.
    ViewportRequest(ViewportQuery),
    /// Read one tile.
    TileQuery {
        /// Tile to read.
        position: WorldPos,
        /// Where to deliver the result.
        callback_id: CallbackId,
    },
    /// Apply a partial tile edit.
    ModifyTile {
        /// Tile to change.
        position: WorldPos,
        /// Fields to overwrite.
        edit: TileEdit,
    },
}

impl WorldEvent {
    /// Routing key.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ViewportRequest(_) => EventKind::ViewportRequest,
            Self::TileQuery { .. } => EventKind::TileQuery,
            Self::ModifyTile { .. } => EventKind::ModifyTile,
        }
    }
}

/// Event routing key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`WorldEvent::ViewportRequest`].
    ViewportRequest,
    /// [`WorldEvent::TileQuery`].
    TileQuery,
    /// [`WorldEvent::ModifyTile`].
    ModifyTile,
}

/// Typed event bus.
#[derive(Debug, Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<EventKind, Vec<Sender<WorldEvent>>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to one event kind.
    pub fn subscribe(&self, kind: EventKind) -> Receiver<WorldEvent> {
        self.subscribe_all(&[kind])
    }

    /// Subscribes one channel to several kinds; events arrive in emit order.
    pub fn subscribe_all(&self, kinds: &[EventKind]) -> Receiver<WorldEvent> {
        let (tx, rx) = unbounded();
        let mut listeners = self.listeners.lock();
        for &kind in kinds {
            listeners.entry(kind).or_default().push(tx.clone());
        }
        tracing::debug!(?kinds, "event subscriber added");
        rx
    }

    /// Delivers `event` to every live subscriber of its kind.
    ///
    /// Returns how many subscribers received it.
    pub fn emit(&self, event: WorldEvent) -> usize {
        let kind = event.kind();
        let mut listeners = self.listeners.lock();
        let Some(senders) = listeners.get_mut(&kind) else {
            return 0;
        };
        senders.retain(|tx| tx.send(event).is_ok());
        senders.len()
    }

    /// Live subscribers for `kind`, as of the last emit.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }
}
