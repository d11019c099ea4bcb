//! Per-record mutual exclusion for tier-field mutation.
//!
//! Concurrent retry and delete (or two concurrent retries) on the same
//! record must not interleave their file operations and metadata updates.
//! Operations on different records never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-record async locks.
#[derive(Default)]
pub struct RecordLocks {
    locks: Mutex<HashMap<i32, Arc<AsyncMutex<()>>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a record, waiting if another operation on the
    /// same record is in flight.
    pub async fn acquire(&self, record_id: i32) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("record lock registry poisoned");
            locks
                .entry(record_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop the registry entry for a deleted record.
    pub fn forget(&self, record_id: i32) {
        let mut locks = self.locks.lock().expect("record lock registry poisoned");
        locks.remove(&record_id);
    }
}
