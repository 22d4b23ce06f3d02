use super::{QueueDescriptor, QueueError, QueueLocation, QueueStore};
use std::fmt;
use tracing::{debug, instrument};

/// Unique identifier for a group of consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerGroupIdentifier {
    /// Maintains per-member unread counters
    Unread,
    /// Maintains per-member read receipt counters
    Reply,
    /// Purges removed user accounts
    RemoveUser,
    /// Unknown consumer group
    Other(String),
}

impl fmt::Display for ConsumerGroupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unread => write!(f, "group:unread"),
            Self::Reply => write!(f, "group:reply"),
            Self::RemoveUser => write!(f, "group:remove:user"),
            Self::Other(identifier) => write!(f, "{}", identifier),
        }
    }
}

/// Definition of a consumer group
///
/// In a message queue, a group of consumers collaborates to consume messages.
/// Each message is only delivered to one consumer within the same group, identified
/// by a [`ConsumerGroupIdentifier`]. When it is created, they start processing messages
/// from the provided [`QueueLocation`].
#[derive(Debug, Clone)]
pub struct ConsumerGroupDescriptor {
    identifier: ConsumerGroupIdentifier,
    start: QueueLocation,
}

impl ConsumerGroupDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(identifier: ConsumerGroupIdentifier, start: QueueLocation) -> Self {
        Self { identifier, start }
    }

    /// Unique identifier of the group
    pub fn identifier(&self) -> &ConsumerGroupIdentifier {
        &self.identifier
    }

    /// Location from where a consumer group begins to consume messages
    ///
    /// Note that it is not guaranteed that this will be honored (e.g. when the group already exists)!
    pub fn start(&self) -> &QueueLocation {
        &self.start
    }
}

/// Unique identifier of a consumer within a [`ConsumerGroup`](ConsumerGroupDescriptor)
pub type ConsumerIdentifier = String;

/// Registers a consumer group on a queue, creating the queue if necessary
///
/// A group that already exists is treated as a success. Every other failure is passed on.
#[instrument(skip(store, queue, group), fields(queue = queue.key(), group = %group.identifier()))]
pub async fn init_group<S>(
    store: &S,
    queue: &QueueDescriptor,
    group: &ConsumerGroupDescriptor,
) -> Result<(), QueueError>
where
    S: QueueStore + Send + Sync,
{
    match store.create_group(queue, group).await {
        Ok(()) => {
            debug!("Created consumer group");
            Ok(())
        }
        Err(QueueError::GroupExists) => {
            debug!("Consumer group already exists");
            Ok(())
        }
        Err(error) => Err(error),
    }
}
