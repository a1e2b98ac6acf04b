//! The best-safe-height cache shared by concurrent block requests.

use std::sync::{Mutex, PoisonError};

use crate::types::{BlockHeight, GENESIS_HEIGHT};

/// Highest block height currently believed deep enough to index.
///
/// Starts at genesis and only ever moves up. The lock is held for the
/// read or the compare-and-raise, never across an RPC round trip.
#[derive(Debug)]
pub struct SafeHeight {
    height: Mutex<BlockHeight>,
}

impl SafeHeight {
    pub fn new() -> Self {
        Self {
            height: Mutex::new(GENESIS_HEIGHT),
        }
    }

    pub fn get(&self) -> BlockHeight {
        *self.height.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raise the cached height to `candidate` if it is higher and return the
    /// value now cached.
    pub fn advance(&self, candidate: BlockHeight) -> BlockHeight {
        let mut height = self.height.lock().unwrap_or_else(PoisonError::into_inner);
        if candidate > *height {
            *height = candidate;
        }
        *height
    }
}

impl Default for SafeHeight {
    fn default() -> Self {
        Self::new()
    }
}
