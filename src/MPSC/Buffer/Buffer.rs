// This is the shared overwrite ring between the producers and the one consumer

use super::layout::ChannelState;
use crate::Core::SlotLock;

use std::cell::UnsafeCell;

/// The smallest ring where the producer never waits: its leading edge and the
/// consumer's slot can both be held while a third slot is still free.
pub const MIN_CAPACITY: usize = 3;

/// A single cell of the ring.
///
/// Cache-line aligned so that a producer spinning on one slot does not evict
/// the line the consumer is reading from.
#[repr(C, align(64))]
pub struct Slot {
    /// Busy flag. Held by exactly one worker at a time; nobody touches
    /// `payload` without holding it.
    pub(crate) lock: SlotLock,

    /// `None` once consumed (or never written), `Some(sequence)` otherwise.
    pub(crate) payload: UnsafeCell<Option<u64>>,
}

// Payload access is gated by `lock`.
unsafe impl Sync for Slot {}

impl Slot {
    pub(crate) const fn empty() -> Self {
        Self {
            lock: SlotLock::new(),
            payload: UnsafeCell::new(None),
        }
    }
}

/// A fixed-size ring of slots plus the process-wide counters and flags every
/// worker shares.
///
/// ### Concurrency design:
/// - **Producers** hold one slot locked as their *leading edge*. To publish
///   they lock the next free slot ahead, write into it, and only then release
///   the slot they were holding.
/// - **The consumer** locks the slot after its position. If that slot is the
///   leading edge it walks *backward* until it finds a free slot, so it can
///   never read past the newest write.
///
/// There is no head/tail metadata: the busy flags are the whole protocol.
pub struct RingChannel {
    /// Allocated once by the builder and never resized.
    pub(crate) slots: Box<[Slot]>,

    /// Issue counter, failure flag, role claims, producer seat.
    pub(crate) state: ChannelState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoffset::offset_of;
    use std::mem::{align_of, size_of};

    #[test]
    fn slot_layout() {
        let size = size_of::<Slot>();
        let align = align_of::<Slot>();
        let off_lock = offset_of!(Slot, lock);
        let off_payload = offset_of!(Slot, payload);

        println!("Slot => size: {size}, align: {align}, offsets: [lock:{off_lock}, payload:{off_payload}]");

        assert_eq!(align, 64);
        assert_eq!(size, 64);
        assert_eq!(off_lock, 0);
        assert_eq!(off_payload, align_of::<Option<u64>>());
    }
}
