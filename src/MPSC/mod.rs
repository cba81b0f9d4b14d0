mod builder;
mod consumer;
mod producer;
pub mod runner;

pub use builder::{create_channel, ChannelBuilder};
pub use consumer::{run_consumer, run_consumer_with};
pub use producer::run_producer;
pub use runner::{run, run_with, RunConfig, RunOutcome};

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use Buffer::{RingChannel, Slot, MIN_CAPACITY}; // re-export for stable path
    pub use Buffer_impl::SlotGuard;
}

pub mod Structs {
    pub mod Buffer_Structs;
    pub use Buffer_Structs::{
        ConsumerConfig, Delivery, DeliveryReport, ProducerConfig, ProducerReport, SequenceSource,
        ViolationDetail,
    }; // re-export for stable path
}

pub use Buffer::RingChannel;
pub use Structs::{
    ConsumerConfig, Delivery, DeliveryReport, ProducerConfig, ProducerReport, SequenceSource,
    ViolationDetail,
};
