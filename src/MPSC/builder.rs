use super::Buffer::RingChannel;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

pub struct ChannelBuilder {
    capacity: usize,
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self {
            capacity: 4, // 4 slots default
        }
    }
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Allocate the ring. This is the only allocation the channel ever makes.
    pub fn build(self) -> Result<Arc<RingChannel>> {
        let channel = RingChannel::with_capacity(self.capacity)?;
        debug!(capacity = self.capacity, "ring channel created");
        Ok(Arc::new(channel))
    }
}

/// Allocate a ring of `capacity` empty slots.
pub fn create_channel(capacity: usize) -> Result<Arc<RingChannel>> {
    ChannelBuilder::new().with_capacity(capacity).build()
}
