//! Single-slot pending request flag

use std::sync::atomic::{AtomicBool, Ordering};

/// Cross-thread "a dispatch was requested" flag.
///
/// The trigger handler is the only producer and the main loop the only
/// consumer. Triggers that arrive before the consumer takes the flag
/// coalesce into one pending request; they are never queued.
#[derive(Debug, Default)]
pub struct PendingRequest {
    flag: AtomicBool,
}

impl PendingRequest {
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Mark a request as pending.
    ///
    /// Returns `false` if one was already pending (the trigger coalesced).
    pub fn signal(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    /// Consume the pending request, if any
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming
    pub fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
