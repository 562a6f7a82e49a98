//! FaceLock Vault - In-Flight Guard
//!
//! Single-slot busy flag for operations that must never overlap
//! (verify, create, browse). Acquiring hands out a token; the slot is
//! released when the token drops, including on early return or panic.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{VaultError, VaultResult};

/// Busy flag for one operation
#[derive(Debug)]
pub struct InFlight {
    /// Operation name used in the busy message
    operation: &'static str,
    busy: AtomicBool,
}

/// Token proving the slot is held
#[derive(Debug)]
pub struct InFlightToken<'a> {
    slot: &'a InFlight,
}

impl InFlight {
    pub const fn new(operation: &'static str) -> Self {
        Self {
            operation,
            busy: AtomicBool::new(false),
        }
    }

    /// Take the slot, or fail with `VaultError::Busy` if it is held
    pub fn acquire(&self) -> VaultResult<InFlightToken<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightToken { slot: self })
            .map_err(|_| VaultError::Busy(self.operation))
    }

    /// Check if an operation is outstanding
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightToken<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}
