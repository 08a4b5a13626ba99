//! Correlation-id generation.

use std::sync::Mutex;

use overdraft_types::RequestId;

/// Process-wide monotone counter for correlation ids.
///
/// One increment per upgrade call, serialized by a mutex so concurrent
/// generation never collides or skips: ids are pairwise distinct and
/// contiguous from 1 after a rewind. Generation order need not match
/// completion order.
#[derive(Debug, Default)]
pub struct RequestCounter {
    next: Mutex<u64>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next id.
    pub fn next_id(&self) -> RequestId {
        let mut guard = self.next.lock().expect("request counter lock poisoned");
        *guard += 1;
        RequestId::new(*guard)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        *self.next.lock().expect("request counter lock poisoned")
    }

    /// Rewinds to zero. Only meaningful as part of a full system reset.
    pub fn rewind(&self) {
        *self.next.lock().expect("request counter lock poisoned") = 0;
    }
}
