//! # Id Pool
//!
//! Hands out compact 32-bit ids for the wire. Released ids are reused before
//! fresh ones are minted.

use std::sync::atomic::{AtomicI32, Ordering};

use parking_lot::Mutex;

use crate::error::{WorldError, WorldResult};

/// Pool of positive 32-bit ids.
#[derive(Debug, Default)]
pub struct IdPool {
    /// Last minted id.
    last: AtomicI32,
    /// Ids returned by their owners.
    free: Mutex<Vec<i32>>,
}

impl IdPool {
    /// Creates an empty pool. The first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes an id.
    ///
    /// # Errors
    ///
    /// `IdPoolExhausted` once `i32::MAX` ids are live.
    pub fn acquire(&self) -> WorldResult<i32> {
        if let Some(id) = self.free.lock().pop() {
            return Ok(id);
        }
        self.last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| last.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(|_| WorldError::IdPoolExhausted)
    }

    /// Returns an id for reuse.
    pub fn release(&self, id: i32) {
        self.free.lock().push(id);
    }
}
