// Configuration handed to the workers and the reports they hand back

use crate::Core::CostModel;
use std::fmt;
use std::sync::Arc;

/// Where a producer gets its sequence numbers from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SequenceSource {
    /// A counter local to the producer, starting at 0. Only valid with a
    /// single producer on the channel.
    #[default]
    Private,
    /// The channel's issue counter, starting at 1. Producers using it share
    /// one leading edge.
    Shared,
}

#[derive(Clone, Default)]
pub struct ProducerConfig {
    /// Private: stop after writing this value. Shared: stop once a drawn
    /// ticket exceeds it. `None` runs until the channel halts.
    pub final_sequence: Option<u64>,
    pub sequence: SequenceSource,
    /// Simulated work before each write.
    pub cost: Option<Arc<dyn CostModel>>,
}

impl ProducerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_final_sequence(mut self, final_sequence: u64) -> Self {
        self.final_sequence = Some(final_sequence);
        self
    }

    pub fn with_shared_counter(mut self) -> Self {
        self.sequence = SequenceSource::Shared;
        self
    }

    pub fn with_cost(mut self, cost: Arc<dyn CostModel>) -> Self {
        self.cost = Some(cost);
        self
    }
}

impl fmt::Debug for ProducerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerConfig")
            .field("final_sequence", &self.final_sequence)
            .field("sequence", &self.sequence)
            .field("cost", &self.cost.as_ref().map(|_| "<cost model>"))
            .finish()
    }
}

#[derive(Clone)]
pub struct ConsumerConfig {
    /// Stop after delivering this value.
    pub final_sequence: u64,
    /// Simulated work before each read cycle.
    pub cost: Option<Arc<dyn CostModel>>,
}

impl ConsumerConfig {
    pub fn new(final_sequence: u64) -> Self {
        Self {
            final_sequence,
            cost: None,
        }
    }

    pub fn with_cost(mut self, cost: Arc<dyn CostModel>) -> Self {
        self.cost = Some(cost);
        self
    }
}

impl fmt::Debug for ConsumerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerConfig")
            .field("final_sequence", &self.final_sequence)
            .field("cost", &self.cost.as_ref().map(|_| "<cost model>"))
            .finish()
    }
}

/// What a producer did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerReport {
    /// Messages written into the ring (overwritten ones included).
    pub written: u64,
    pub last_written: Option<u64>,
    /// Most slots probed to publish a single message.
    pub max_probes: u32,
    /// Stopped because the channel failed or was interrupted.
    pub halted: bool,
}

impl ProducerReport {
    pub(crate) fn record(&mut self, value: u64, probes: u32) {
        self.written += 1;
        self.last_written = Some(value);
        self.max_probes = self.max_probes.max(probes);
    }
}

/// One value handed to the consumer's delivery sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub slot_index: usize,
    pub value: u64,
}

/// Diagnostic state captured when the consumer sees a value that is not
/// strictly greater than the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationDetail {
    pub slot_index: usize,
    pub observed_value: u64,
    pub last_value: u64,
}

impl fmt::Display for ViolationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slot {} held {} after {} was already delivered",
            self.slot_index, self.observed_value, self.last_value
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered_count: u64,
    pub last_delivered: Option<u64>,
    pub ordering_violation: bool,
    pub violation_detail: Option<ViolationDetail>,
}

impl DeliveryReport {
    pub(crate) fn deliver(&mut self, value: u64) {
        self.delivered_count += 1;
        self.last_delivered = Some(value);
    }

    pub(crate) fn violation(&mut self, detail: ViolationDetail) {
        self.ordering_violation = true;
        self.violation_detail = Some(detail);
    }
}
