use std::marker::PhantomData;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

use super::layout::{ChannelState, NO_SLOT, PRIVATE_PRODUCER};
use super::Buffer::{RingChannel, Slot, MIN_CAPACITY};
use crate::error::{ChannelError, Result};

impl RingChannel {
    /// Allocate `capacity` empty, unlocked slots.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity < MIN_CAPACITY {
            return Err(ChannelError::InvalidCapacity {
                requested: capacity,
                min: MIN_CAPACITY,
            });
        }

        let slots: Box<[Slot]> = (0..capacity).map(|_| Slot::empty()).collect();
        Ok(Self {
            slots,
            state: ChannelState::default(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn next(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    #[inline]
    pub(crate) fn prev(&self, index: usize) -> usize {
        (index + self.capacity() - 1) % self.capacity()
    }

    /// Test-and-set the busy flag of slot `index`.
    #[inline]
    pub fn try_acquire(&self, index: usize) -> bool {
        self.slots[index].lock.try_acquire()
    }

    /// Clear the busy flag of slot `index`.
    ///
    /// # Safety
    /// The caller must be the worker that acquired it.
    #[inline]
    pub unsafe fn release(&self, index: usize) {
        self.slots[index].lock.release();
    }

    /// # Safety
    /// The caller must hold slot `index`.
    #[inline]
    pub(crate) unsafe fn write(&self, index: usize, value: u64) {
        *self.slots[index].payload.get() = Some(value);
    }

    /// Lock slot `index` and wrap it in a guard that releases on drop.
    pub fn try_lock(&self, index: usize) -> Option<SlotGuard<'_>> {
        if self.try_acquire(index) {
            Some(SlotGuard {
                channel: self,
                index,
                _not_send: PhantomData,
            })
        } else {
            None
        }
    }

    /// Probe forward from `from` until a slot is acquired.
    ///
    /// Returns the acquired index and the number of probes it took. Locked
    /// slots are skipped, never waited on. Gives up with `None` only if the
    /// channel halts while every slot is taken.
    pub(crate) fn acquire_forward(&self, from: usize) -> Option<(usize, u32)> {
        let mut index = from % self.capacity();
        let mut probes = 0u32;
        loop {
            probes = probes.saturating_add(1);
            if self.try_acquire(index) {
                return Some((index, probes));
            }
            index = self.next(index);
            if probes as usize % self.capacity() == 0 {
                if self.is_halted() {
                    return None;
                }
                std::hint::spin_loop();
            }
        }
    }

    /// Probe from `from` and then backward until a slot is acquired.
    pub(crate) fn acquire_backward(&self, from: usize) -> Option<SlotGuard<'_>> {
        let mut index = from % self.capacity();
        let mut probes = 0usize;
        loop {
            if let Some(guard) = self.try_lock(index) {
                return Some(guard);
            }
            index = self.prev(index);
            probes += 1;
            if probes % self.capacity() == 0 {
                if self.is_halted() {
                    return None;
                }
                std::hint::spin_loop();
            }
        }
    }

    /// Put `value` into slot `index` if the slot is free right now.
    ///
    /// Goes through the busy flag like any worker would. Returns `false`
    /// without writing if the slot is held.
    pub fn store(&self, index: usize, value: u64) -> bool {
        match self.try_lock(index) {
            Some(mut guard) => {
                guard.set(value);
                true
            }
            None => false,
        }
    }

    /// Read slot `index` without consuming it. `None` if the slot is held.
    pub fn peek(&self, index: usize) -> Option<Option<u64>> {
        self.try_lock(index).map(|guard| guard.get())
    }

    // ---------------------------------------------------------------------
    // Shared counters and flags
    // ---------------------------------------------------------------------

    /// Draw the next ticket from the issue counter (first ticket is 1).
    #[inline]
    pub fn issue(&self) -> u64 {
        self.state.issued.fetch_add(1, AcqRel) + 1
    }

    /// Number of tickets drawn so far.
    pub fn issued(&self) -> u64 {
        self.state.issued.load(Acquire)
    }

    /// Raise the failure flag. Returns `true` for the call that raised it.
    pub(crate) fn fail(&self) -> bool {
        !self.state.failed.swap(true, AcqRel)
    }

    pub fn is_failed(&self) -> bool {
        self.state.failed.load(Acquire)
    }

    /// Ask every worker on this channel to stop.
    pub fn interrupt(&self) {
        self.state.interrupted.store(true, Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.state.interrupted.load(Acquire)
    }

    /// Failed or interrupted.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.is_failed() || self.is_interrupted()
    }

    // ---------------------------------------------------------------------
    // Role claims
    // ---------------------------------------------------------------------

    pub(crate) fn claim_consumer(&self) -> Result<RoleClaim<'_>> {
        if self.state.consumer_attached.swap(true, AcqRel) {
            return Err(ChannelError::ConsumerBusy);
        }
        Ok(RoleClaim {
            channel: self,
            role: ClaimKind::Consumer,
        })
    }

    pub(crate) fn claim_private_producer(&self) -> Result<RoleClaim<'_>> {
        self.state
            .producer_claims
            .compare_exchange(0, PRIVATE_PRODUCER, AcqRel, Acquire)
            .map_err(|_| ChannelError::ProducerConflict)?;
        Ok(RoleClaim {
            channel: self,
            role: ClaimKind::PrivateProducer,
        })
    }

    pub(crate) fn claim_shared_producer(&self) -> Result<RoleClaim<'_>> {
        let claims = &self.state.producer_claims;
        let mut current = claims.load(Acquire);
        loop {
            if current == PRIVATE_PRODUCER {
                return Err(ChannelError::ProducerConflict);
            }
            match claims.compare_exchange_weak(current, current + 1, AcqRel, Acquire) {
                Ok(_) => {
                    return Ok(RoleClaim {
                        channel: self,
                        role: ClaimKind::SharedProducer,
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    // ---------------------------------------------------------------------
    // Producer seat
    // ---------------------------------------------------------------------

    /// Try to take the shared leading edge. Never waits.
    pub(crate) fn try_take_seat(&self) -> Option<SeatTurn<'_>> {
        if self.state.seat.lock.try_acquire() {
            Some(SeatTurn { channel: self })
        } else {
            None
        }
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.state.seat.exhausted.load(Acquire)
    }
}

/// Exclusive access to one locked slot. Releases the busy flag on drop.
pub struct SlotGuard<'a> {
    channel: &'a RingChannel,
    index: usize,
    // The lock belongs to the thread that took it.
    _not_send: PhantomData<*const ()>,
}

impl SlotGuard<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self) -> Option<u64> {
        unsafe { *self.channel.slots[self.index].payload.get() }
    }

    pub fn set(&mut self, value: u64) {
        unsafe { self.channel.write(self.index, value) }
    }

    /// Read the payload and mark the slot consumed.
    pub fn take(&mut self) -> Option<u64> {
        unsafe { (*self.channel.slots[self.index].payload.get()).take() }
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        unsafe { self.channel.release(self.index) }
    }
}

enum ClaimKind {
    Consumer,
    PrivateProducer,
    SharedProducer,
}

/// Registration of a worker on the channel, dropped when the worker exits.
pub(crate) struct RoleClaim<'a> {
    channel: &'a RingChannel,
    role: ClaimKind,
}

impl Drop for RoleClaim<'_> {
    fn drop(&mut self) {
        let state = &self.channel.state;
        match self.role {
            ClaimKind::Consumer => state.consumer_attached.store(false, Release),
            ClaimKind::PrivateProducer => state.producer_claims.store(0, Release),
            ClaimKind::SharedProducer => {
                // The last shared producer out returns the edge's slot, even if
                // it left because of a halt while someone else sat in the seat.
                if state.producer_claims.fetch_sub(1, AcqRel) == 1 {
                    loop {
                        if let Some(turn) = self.channel.try_take_seat() {
                            turn.retire();
                            break;
                        }
                        std::hint::spin_loop();
                    }
                }
            }
        }
    }
}

/// One producer's turn at the shared leading edge. Returns the seat on drop.
pub(crate) struct SeatTurn<'a> {
    channel: &'a RingChannel,
}

impl SeatTurn<'_> {
    /// Slot the shared edge currently holds.
    pub(crate) fn held(&self) -> Option<usize> {
        match self.channel.state.seat.held.load(Relaxed) {
            NO_SLOT => None,
            index => Some(index),
        }
    }

    pub(crate) fn park(&self, index: usize) {
        self.channel.state.seat.held.store(index, Relaxed);
    }

    /// Release the edge's slot, if any, and leave the seat empty.
    pub(crate) fn retire(&self) {
        if let Some(index) = self.held() {
            unsafe { self.channel.release(index) };
            self.park(NO_SLOT);
        }
    }

    /// The message budget ran out: no more tickets will be written.
    pub(crate) fn exhaust(&self) {
        self.retire();
        self.channel.state.seat.exhausted.store(true, Release);
    }
}

impl Drop for SeatTurn<'_> {
    fn drop(&mut self) {
        unsafe { self.channel.state.seat.lock.release() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> RingChannel {
        RingChannel::with_capacity(capacity).unwrap()
    }

    #[test]
    fn rejects_tiny_rings() {
        assert!(matches!(
            RingChannel::with_capacity(2),
            Err(ChannelError::InvalidCapacity { requested: 2, min: 3 })
        ));
        assert!(RingChannel::with_capacity(1).is_err());
        assert!(RingChannel::with_capacity(0).is_err());
        assert!(RingChannel::with_capacity(3).is_ok());
    }

    #[test]
    fn slots_start_empty_and_unlocked() {
        let rb = ring(4);
        for i in 0..4 {
            assert_eq!(rb.peek(i), Some(None));
        }
    }

    #[test]
    fn guard_releases_on_drop() {
        let rb = ring(4);
        {
            let mut guard = rb.try_lock(2).unwrap();
            guard.set(7);
            assert!(rb.try_lock(2).is_none());
            assert_eq!(rb.peek(2), None);
        }
        assert_eq!(rb.peek(2), Some(Some(7)));
    }

    #[test]
    fn take_consumes_the_payload() {
        let rb = ring(4);
        assert!(rb.store(1, 3));
        let mut guard = rb.try_lock(1).unwrap();
        assert_eq!(guard.take(), Some(3));
        assert_eq!(guard.take(), None);
    }

    #[test]
    fn store_refuses_held_slots() {
        let rb = ring(4);
        let _held = rb.try_lock(0).unwrap();
        assert!(!rb.store(0, 1));
    }

    #[test]
    fn forward_probe_skips_held_slots_and_wraps() {
        let rb = ring(4);
        let _a = rb.try_lock(3).unwrap();
        let _b = rb.try_lock(0).unwrap();
        let (index, probes) = rb.acquire_forward(3).unwrap();
        assert_eq!(index, 1);
        assert_eq!(probes, 3);
    }

    #[test]
    fn backward_probe_steps_behind_the_edge() {
        let rb = ring(4);
        let _edge = rb.try_lock(2).unwrap();
        let guard = rb.acquire_backward(2).unwrap();
        assert_eq!(guard.index(), 1);
    }

    #[test]
    fn full_ring_gives_up_once_halted() {
        let rb = ring(3);
        let _a = rb.try_lock(0).unwrap();
        let _b = rb.try_lock(1).unwrap();
        let _c = rb.try_lock(2).unwrap();
        rb.interrupt();
        assert!(rb.acquire_forward(0).is_none());
        assert!(rb.acquire_backward(0).is_none());
    }

    #[test]
    fn tickets_start_at_one() {
        let rb = ring(3);
        assert_eq!(rb.issue(), 1);
        assert_eq!(rb.issue(), 2);
        assert_eq!(rb.issued(), 2);
    }

    #[test]
    fn failure_flag_is_sticky_and_raised_once() {
        let rb = ring(3);
        assert!(!rb.is_halted());
        assert!(rb.fail());
        assert!(!rb.fail());
        assert!(rb.is_failed());
        assert!(rb.is_halted());
        assert!(!rb.is_interrupted());
    }

    #[test]
    fn second_consumer_is_rejected() {
        let rb = ring(3);
        let claim = rb.claim_consumer().unwrap();
        assert!(matches!(rb.claim_consumer(), Err(ChannelError::ConsumerBusy)));
        drop(claim);
        assert!(rb.claim_consumer().is_ok());
    }

    #[test]
    fn private_producer_excludes_everyone_else() {
        let rb = ring(3);
        let private = rb.claim_private_producer().unwrap();
        assert!(rb.claim_shared_producer().is_err());
        assert!(rb.claim_private_producer().is_err());
        drop(private);

        let a = rb.claim_shared_producer().unwrap();
        let b = rb.claim_shared_producer().unwrap();
        assert!(matches!(
            rb.claim_private_producer(),
            Err(ChannelError::ProducerConflict)
        ));
        drop(a);
        drop(b);
        assert!(rb.claim_private_producer().is_ok());
    }

    #[test]
    fn last_shared_producer_returns_the_edge() {
        let rb = ring(4);
        let claim = rb.claim_shared_producer().unwrap();
        {
            let turn = rb.try_take_seat().unwrap();
            assert!(rb.try_take_seat().is_none());
            assert!(rb.try_acquire(2));
            turn.park(2);
        }
        drop(claim);
        assert_eq!(rb.peek(2), Some(None));
        assert!(rb.try_take_seat().unwrap().held().is_none());
    }
}
