//! Queue key registry
//!
//! Process-wide uniqueness constraint on caller-supplied 64-bit queue
//! keys. A second creation under the same nonzero key must fail
//! deterministically instead of producing a duplicate queue; key 0
//! means no sharing was requested and is never inserted.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::EventQueue;
use crate::error::CellError;

#[derive(Debug)]
pub struct KeyRegistry {
    map: Mutex<BTreeMap<u64, Arc<EventQueue>>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(BTreeMap::new()),
        }
    }

    /// Claim `key` for `queue`. Fails `CELL_EEXIST` if the key is
    /// already taken; the caller must then abandon queue creation.
    pub fn register(&self, queue: &Arc<EventQueue>, key: u64) -> Result<(), CellError> {
        if key == 0 {
            return Ok(());
        }
        match self.map.lock().entry(key) {
            Entry::Occupied(_) => Err(CellError::Exist),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(queue));
                Ok(())
            }
        }
    }

    /// Release `key`. No-op for key 0 or a key that was never claimed.
    pub fn unregister(&self, key: u64) {
        if key != 0 {
            self.map.lock().remove(&key);
        }
    }

    /// Number of live keyed queues.
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }
}
