// src/MPSC/consumer.rs

use crate::error::Result;
use crate::MPSC::Buffer::RingChannel;
use crate::MPSC::Structs::{ConsumerConfig, Delivery, DeliveryReport, ViolationDetail};
use tracing::{debug, error};

/// Run the consumer until it delivers `config.final_sequence` or the channel
/// halts.
pub fn run_consumer(channel: &RingChannel, config: &ConsumerConfig) -> Result<DeliveryReport> {
    run_consumer_with(channel, config, |_| {})
}

/// Like [`run_consumer`], handing every delivered value to `sink` in
/// delivery order.
///
/// Each cycle locks the slot after the current position. When that slot is
/// a producer's leading edge the consumer steps backward until it finds a
/// free slot, so it never reads ahead of the newest write. Empty slots are
/// skipped silently. A value that is not strictly greater than the last one
/// delivered raises the channel's failure flag and ends the run.
pub fn run_consumer_with<F>(
    channel: &RingChannel,
    config: &ConsumerConfig,
    mut sink: F,
) -> Result<DeliveryReport>
where
    F: FnMut(Delivery),
{
    let _claim = channel.claim_consumer()?;
    let cost = config.cost.as_deref();

    let mut report = DeliveryReport::default();
    let mut position = 0usize;
    let mut last: Option<u64> = None;

    loop {
        if channel.is_halted() {
            break;
        }
        if let Some(cost) = cost {
            cost.spend();
        }

        let Some(mut guard) = channel.acquire_backward(channel.next(position)) else {
            break;
        };
        position = guard.index();

        let Some(value) = guard.take() else {
            continue;
        };
        drop(guard);

        if let Some(last_value) = last.filter(|&prev| value <= prev) {
            let detail = ViolationDetail {
                slot_index: position,
                observed_value: value,
                last_value,
            };
            channel.fail();
            error!(
                slot = detail.slot_index,
                observed = detail.observed_value,
                last = detail.last_value,
                ring = %channel.snapshot(),
                "ordering violation"
            );
            report.violation(detail);
            break;
        }

        last = Some(value);
        report.deliver(value);
        sink(Delivery {
            slot_index: position,
            value,
        });

        if value >= config.final_sequence {
            break;
        }
    }

    debug!(
        delivered = report.delivered_count,
        last = ?report.last_delivered,
        violation = report.ordering_violation,
        "consumer finished"
    );
    Ok(report)
}
