// Module naming follows project convention (MPSC = Multi-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod MPSC;

#[allow(non_snake_case)]
pub mod Core {
    pub mod cost;
    pub mod lock;
    pub use cost::{CostModel, Jitter, NoCost, Spin};
    pub use lock::SlotLock;
}

#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}

pub mod error;

pub use error::{ChannelError, Result};
pub use MPSC::{
    create_channel, run_consumer, run_consumer_with, run_producer, ChannelBuilder, RingChannel,
};
