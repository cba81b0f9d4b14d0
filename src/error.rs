use std::io;
use thiserror::Error;

/// Which side of the channel a worker plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer(usize),
    Consumer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Producer(i) => write!(f, "producer {i}"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// Errors surfaced by the channel and the run harness.
///
/// Ordering violations are deliberately absent: they are reported through
/// [`DeliveryReport`](crate::MPSC::Structs::DeliveryReport) and the channel's
/// sticky failure flag, never as a `Result` error.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel capacity must be at least {min} slots, got {requested}")]
    InvalidCapacity { requested: usize, min: usize },

    #[error("a consumer is already attached to this channel")]
    ConsumerBusy,

    #[error("a private-counter producer cannot share the channel with another producer")]
    ProducerConflict,

    #[error("shared tickets start at 1, so a shared run needs a final sequence of at least 1")]
    EmptyBudget,

    #[error("failed to launch {role}")]
    Launch {
        role: Role,
        #[source]
        source: io::Error,
    },

    #[error("{role} panicked before it could be joined")]
    Join { role: Role },
}

pub type Result<T> = std::result::Result<T, ChannelError>;
