// In src/MPSC/producer.rs
use crate::error::Result;
use crate::Core::CostModel;
use crate::MPSC::Buffer::layout::NO_SLOT;
use crate::MPSC::Buffer::RingChannel;
use crate::MPSC::Structs::{ProducerConfig, ProducerReport, SequenceSource};
use tracing::debug;

/// The slot a producer holds locked. It carries the newest value once the
/// first write lands, and nothing ahead of it is newer.
pub(crate) struct LeadingEdge {
    held: usize,
}

impl LeadingEdge {
    /// Lock the first free slot scanning forward from slot 0.
    pub(crate) fn claim(channel: &RingChannel) -> Option<Self> {
        channel
            .acquire_forward(0)
            .map(|(held, _)| Self { held })
    }

    /// Resume an edge whose slot is already locked on our behalf.
    pub(crate) fn resume(held: usize) -> Self {
        Self { held }
    }

    pub(crate) fn held(&self) -> usize {
        self.held
    }

    /// Move the edge into the next free slot and write `value` there.
    ///
    /// The next slot is locked before anything is written and the old slot is
    /// released only after the write. The new value stays under the edge's
    /// lock until the following publish or [`retire`](Self::retire) hands it
    /// to the consumer. Returns the probe count, or `None` if the channel
    /// halted, in which case nothing was written and the edge is unchanged.
    pub(crate) fn publish(&mut self, channel: &RingChannel, value: u64) -> Option<u32> {
        let (next, probes) = channel.acquire_forward(channel.next(self.held))?;
        if channel.is_halted() {
            unsafe { channel.release(next) };
            return None;
        }
        unsafe {
            channel.write(next, value);
            channel.release(self.held);
        }
        self.held = next;
        Some(probes)
    }

    /// Give up the held slot.
    pub(crate) fn retire(self, channel: &RingChannel) {
        unsafe { channel.release(self.held) };
    }
}

/// Run one producer to completion.
///
/// Never waits on the consumer. Fails only if the channel already has a
/// producer this one cannot share it with.
pub fn run_producer(channel: &RingChannel, config: &ProducerConfig) -> Result<ProducerReport> {
    let cost = config.cost.as_deref();
    let report = match config.sequence {
        SequenceSource::Private => {
            let _claim = channel.claim_private_producer()?;
            produce_private(channel, config.final_sequence, cost)
        }
        SequenceSource::Shared => {
            let _claim = channel.claim_shared_producer()?;
            produce_shared(channel, config.final_sequence, cost)
        }
    };

    debug!(
        written = report.written,
        last = ?report.last_written,
        max_probes = report.max_probes,
        halted = report.halted,
        "producer finished"
    );
    Ok(report)
}

fn produce_private(
    channel: &RingChannel,
    final_sequence: Option<u64>,
    cost: Option<&dyn CostModel>,
) -> ProducerReport {
    let mut report = ProducerReport::default();
    let Some(mut edge) = LeadingEdge::claim(channel) else {
        report.halted = true;
        return report;
    };

    let mut next_value = 0u64;
    loop {
        if channel.is_halted() {
            report.halted = true;
            break;
        }
        if let Some(cost) = cost {
            cost.spend();
        }

        let value = next_value;
        next_value += 1;
        match edge.publish(channel, value) {
            Some(probes) => report.record(value, probes),
            None => {
                report.halted = true;
                break;
            }
        }

        if final_sequence == Some(value) {
            break;
        }
    }

    edge.retire(channel);
    report
}

fn produce_shared(
    channel: &RingChannel,
    final_sequence: Option<u64>,
    cost: Option<&dyn CostModel>,
) -> ProducerReport {
    let mut report = ProducerReport::default();
    loop {
        if channel.is_halted() {
            report.halted = true;
            break;
        }
        if channel.is_exhausted() {
            break;
        }
        if let Some(cost) = cost {
            cost.spend();
        }

        // Someone else is publishing; their write does not depend on us.
        let Some(turn) = channel.try_take_seat() else {
            std::hint::spin_loop();
            continue;
        };

        let ticket = channel.issue();
        if final_sequence.is_some_and(|last| ticket > last) {
            turn.exhaust();
            break;
        }

        let edge = match turn.held() {
            Some(held) => Some(LeadingEdge::resume(held)),
            None => LeadingEdge::claim(channel),
        };
        let Some(mut edge) = edge else {
            report.halted = true;
            break;
        };

        match edge.publish(channel, ticket) {
            Some(probes) => {
                report.record(ticket, probes);
                turn.park(edge.held());
            }
            None => {
                edge.retire(channel);
                turn.park(NO_SLOT);
                report.halted = true;
                break;
            }
        }
    }
    report
}
