use super::{ConsumerGroupDescriptor, EntryId, QueueDescriptor, StreamEntry};
use crate::library::BoxedError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Id preceding every entry of a queue
pub const ENTRY_ID_ORIGIN: &str = "0";

/// Position from which a group read delivers entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadCursor {
    /// Entries previously delivered to the reading consumer but never acknowledged,
    /// starting after the contained id. Reads from this cursor never block.
    Pending(EntryId),
    /// Entries never delivered to any consumer of the group
    New,
}

impl ReadCursor {
    /// Cursor at the very beginning of the consumers pending list
    pub fn pending() -> Self {
        Self::Pending(ENTRY_ID_ORIGIN.to_owned())
    }
}

/// Parameters of a group read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum time to wait for new entries
    pub block: Duration,
    /// Maximum number of entries returned at once
    pub count: usize,
}

/// Errors reported by [`QueueStore`] implementations
#[derive(Debug, Error)]
pub enum QueueError {
    /// Consumer group has been created previously
    #[error("consumer group already exists")]
    GroupExists,
    /// Consumer group has not been created yet or vanished with its queue
    #[error("consumer group {group} does not exist on {queue}")]
    NoGroup {
        /// Key of the queue
        queue: String,
        /// Identifier of the group
        group: String,
    },
    /// Connection to the broker failed or returned garbage
    #[error("queue transport failure")]
    Transport(#[source] BoxedError),
}

impl QueueError {
    /// Wraps an arbitrary error as a [`QueueError::Transport`]
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<BoxedError>,
    {
        Self::Transport(error.into())
    }
}

/// Append-only log with consumer group semantics
///
/// Entries are immutable once appended. Each consumer group maintains its own cursor and
/// a pending set of entries that have been delivered but not yet acknowledged.
#[async_trait]
pub trait QueueStore {
    /// Appends an entry and returns its id, trimming the queue approximately to its limit
    async fn append(
        &self,
        queue: &QueueDescriptor,
        fields: &[(String, String)],
    ) -> Result<EntryId, QueueError>;

    /// Creates a consumer group (and the queue if it does not exist yet)
    ///
    /// Reports [`QueueError::GroupExists`] if the group is already present.
    async fn create_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<(), QueueError>;

    /// Reads the next batch of entries for a consumer within a group
    ///
    /// With [`ReadCursor::New`] the call waits up to [`ReadOptions::block`] and returns an
    /// empty batch on timeout. Returned new entries are added to the consumers pending list.
    async fn read_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        cursor: &ReadCursor,
        options: &ReadOptions,
    ) -> Result<Vec<StreamEntry>, QueueError>;

    /// Removes an entry from the pending set of a group. Acknowledging twice is harmless.
    async fn ack(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: &str,
    ) -> Result<(), QueueError>;
}

#[async_trait]
impl<T> QueueStore for std::sync::Arc<T>
where
    T: QueueStore + Send + Sync + ?Sized,
{
    async fn append(
        &self,
        queue: &QueueDescriptor,
        fields: &[(String, String)],
    ) -> Result<EntryId, QueueError> {
        (**self).append(queue, fields).await
    }

    async fn create_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<(), QueueError> {
        (**self).create_group(queue, group).await
    }

    async fn read_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        cursor: &ReadCursor,
        options: &ReadOptions,
    ) -> Result<Vec<StreamEntry>, QueueError> {
        (**self)
            .read_group(queue, group, consumer, cursor, options)
            .await
    }

    async fn ack(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: &str,
    ) -> Result<(), QueueError> {
        (**self).ack(queue, group, id).await
    }
}
