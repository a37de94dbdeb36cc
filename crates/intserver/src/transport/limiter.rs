//! Counting limiter for concurrently served connections.

use std::num::NonZeroUsize;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Caps the number of connection handlers running at once.
///
/// The accept loop takes a [`SlotPermit`] before accepting and moves it into
/// the worker thread; dropping the permit frees the slot, including when the
/// worker unwinds.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionLimiter {
    slots: Option<Arc<Slots>>,
}

#[derive(Debug)]
struct Slots {
    available: Mutex<usize>,
    freed: Condvar,
}

impl Slots {
    fn lock(&self) -> MutexGuard<'_, usize> {
        // The count stays consistent even if a holder panicked.
        self.available.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that a connection slot is held.
#[derive(Debug)]
pub(crate) struct SlotPermit {
    slots: Option<Arc<Slots>>,
}

impl ConnectionLimiter {
    pub(crate) fn new(max_threads: Option<NonZeroUsize>) -> Self {
        Self {
            slots: max_threads.map(|limit| {
                Arc::new(Slots {
                    available: Mutex::new(limit.get()),
                    freed: Condvar::new(),
                })
            }),
        }
    }

    pub(crate) fn unbounded() -> Self {
        Self::new(None)
    }

    /// Takes a slot, waiting at most `timeout` for one to free up.
    ///
    /// Returns `None` when the wait timed out so the caller can re-check its
    /// shutdown flag.
    pub(crate) fn acquire(&self, timeout: Duration) -> Option<SlotPermit> {
        let Some(slots) = self.slots.as_ref() else {
            return Some(SlotPermit { slots: None });
        };
        let available = slots.lock();
        let (mut available, _) = slots
            .freed
            .wait_timeout_while(available, timeout, |count| *count == 0)
            .unwrap_or_else(PoisonError::into_inner);
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(SlotPermit {
            slots: Some(Arc::clone(slots)),
        })
    }

    #[cfg(test)]
    pub(crate) fn available(&self) -> Option<usize> {
        self.slots.as_ref().map(|slots| *slots.lock())
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.take() {
            *slots.lock() += 1;
            slots.freed.notify_one();
        }
    }
}
