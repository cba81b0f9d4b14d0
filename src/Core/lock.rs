use std::sync::atomic::{AtomicBool, Ordering};

/// A single-bit spinlock flag.
///
/// This is the only synchronization primitive the ring uses. It never blocks:
/// a failed [`try_acquire`](SlotLock::try_acquire) returns immediately and the
/// caller decides where to probe next.
#[derive(Default)]
#[repr(transparent)]
pub struct SlotLock {
    busy: AtomicBool,
}

impl SlotLock {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Test-and-set. Returns `true` when the flag was clear and is now ours.
    ///
    /// Must stay a single exchange: a load followed by a store would let two
    /// workers both observe "clear" and both proceed.
    #[inline]
    pub fn try_acquire(&self) -> bool {
        !self.busy.swap(true, Ordering::Acquire)
    }

    /// Clear the flag, publishing every write made while it was held.
    ///
    /// # Safety
    /// Only the worker that last acquired the flag may release it. Anything
    /// the flag guards is otherwise open to a data race.
    #[inline]
    pub unsafe fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Racy view of the flag, for diagnostics only.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }
}
