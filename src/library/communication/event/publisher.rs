use super::{EntryId, Notification, QueueDescriptor};
use crate::library::BoxedError;
use async_trait::async_trait;

/// Structure which allows publishing of serialized data into a queue
#[async_trait]
pub trait RawNotificationPublisher {
    /// Appends an opaque payload under the given field `tag` to a [`Queue`](QueueDescriptor)
    async fn publish_raw(
        &self,
        tag: &str,
        data: &str,
        descriptor: QueueDescriptor,
    ) -> Result<EntryId, BoxedError>;
}

/// Publisher for [`Notifications`](Notification)
#[async_trait]
pub trait NotificationPublisher {
    /// Publishes a [`Notification`] to its designated queue and returns the assigned entry id
    async fn publish<N: Notification + Send + Sync>(
        &self,
        notification: &N,
    ) -> Result<EntryId, BoxedError>;
}
