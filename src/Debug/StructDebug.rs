use std::fmt;
use std::sync::atomic::Ordering;

use crate::MPSC::Buffer::{RingChannel, Slot};

/// Debug function for Slot
///
/// Only reports the busy flag; the payload may not be read without holding it.
pub fn debug_slot(slot: &Slot, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Slot")
        .field("busy", &slot.lock.is_held())
        .finish_non_exhaustive()
}

/// Debug function for RingChannel
///
/// Shows:
/// - Capacity and a best-effort snapshot of the slots
/// - Issue counter
/// - Failure / interrupt flags
pub fn debug_ring_channel(channel: &RingChannel, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RingChannel")
        .field("capacity", &channel.capacity())
        .field("slots", &format_args!("{}", channel.snapshot()))
        .field("issued", &channel.state.issued.load(Ordering::Relaxed))
        .field("failed", &channel.is_failed())
        .field("interrupted", &channel.is_interrupted())
        .finish()
}

/// A point-in-time rendering of the ring, e.g. `[X,3,_,7]`.
///
/// `X` marks a slot that was locked when we looked, `_` an empty one.
pub struct Snapshot {
    cells: Box<[Cell]>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Locked,
    Empty,
    Value(u64),
}

impl Snapshot {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match cell {
                Cell::Locked => f.write_str("X")?,
                Cell::Empty => f.write_str("_")?,
                Cell::Value(v) => write!(f, "{v}")?,
            }
        }
        f.write_str("]")
    }
}

impl RingChannel {
    /// Lock each slot in turn and record what it holds.
    ///
    /// Slots held by someone else show up as [`Cell::Locked`]; their payload
    /// is never touched.
    pub fn snapshot(&self) -> Snapshot {
        let cells = (0..self.capacity())
            .map(|i| match self.peek(i) {
                None => Cell::Locked,
                Some(None) => Cell::Empty,
                Some(Some(v)) => Cell::Value(v),
            })
            .collect();
        Snapshot { cells }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_slot(self, f)
    }
}

impl fmt::Debug for RingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_ring_channel(self, f)
    }
}

#[cfg(test)]
mod tests {
    use crate::MPSC::create_channel;

    use super::Cell;

    #[test]
    fn snapshot_marks_locked_and_empty_slots() {
        let channel = create_channel(4).unwrap();
        assert!(channel.store(1, 3));
        assert!(channel.store(3, 7));
        let _held = channel.try_lock(0).unwrap();

        let snapshot = channel.snapshot();
        assert_eq!(
            snapshot.cells(),
            &[Cell::Locked, Cell::Value(3), Cell::Empty, Cell::Value(7)]
        );
        assert_eq!(snapshot.to_string(), "[X,3,_,7]");
    }

    #[test]
    fn debug_output_names_the_counters() {
        let channel = create_channel(3).unwrap();
        channel.issue();
        let rendered = format!("{channel:?}");
        assert!(rendered.contains("capacity: 3"));
        assert!(rendered.contains("issued: 1"));
        assert!(rendered.contains("[_,_,_]"));
    }
}
