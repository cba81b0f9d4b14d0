use crate::Core::SlotLock;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize};

/// Marker for "no slot held".
pub const NO_SLOT: usize = usize::MAX;

/// `producer_claims` value while a private-counter producer owns the channel.
pub(crate) const PRIVATE_PRODUCER: usize = usize::MAX;

/// The shared leading edge used when several producers draw tickets from the
/// issue counter.
///
/// Whoever holds `lock` owns the edge: it draws a ticket, advances the edge
/// one slot and hands the edge back. Tickets are therefore written to the
/// ring in the order they were issued.
pub struct ProducerSeat {
    pub lock: SlotLock,

    /// Index of the slot the edge holds locked, or [`NO_SLOT`].
    /// Only read or written while `lock` is held.
    pub held: AtomicUsize,

    /// Set once a ticket past the message budget was drawn.
    pub exhausted: AtomicBool,
}

/// Process-wide state shared by every worker on one ring.
///
/// Each hot counter sits on its own cache line; producers hammer `issued`
/// and the seat while the consumer only polls the flags.
pub struct ChannelState {
    /// Issue counter. Starts at zero; tickets are `fetch_add(1) + 1`.
    pub issued: CachePadded<AtomicU64>,

    /// Set exactly once, by the consumer, on an ordering violation.
    pub failed: CachePadded<AtomicBool>,

    /// Set by the harness to stop every worker. Never an ordering violation.
    pub interrupted: AtomicBool,

    /// `true` while a consumer is attached.
    pub consumer_attached: AtomicBool,

    /// Number of shared-counter producers running, or [`PRIVATE_PRODUCER`].
    pub producer_claims: AtomicUsize,

    pub seat: CachePadded<ProducerSeat>,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            issued: CachePadded::new(AtomicU64::new(0)),
            failed: CachePadded::new(AtomicBool::new(false)),
            interrupted: AtomicBool::new(false),
            consumer_attached: AtomicBool::new(false),
            producer_claims: AtomicUsize::new(0),
            seat: CachePadded::new(ProducerSeat {
                lock: SlotLock::new(),
                held: AtomicUsize::new(NO_SLOT),
                exhausted: AtomicBool::new(false),
            }),
        }
    }
}
