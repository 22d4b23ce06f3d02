use super::super::event::{EntryId, QueueDescriptor, QueueStore, RawNotificationPublisher};
use super::json::JsonNotificationPublisher;
use crate::library::BoxedError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::trace;

/// [`NotificationPublisher`](super::super::event::NotificationPublisher) appending to any [`QueueStore`]
pub struct StreamPublisher<S> {
    store: Arc<S>,
}

impl<S> StreamPublisher<S> {
    /// Creates a new instance publishing into the given store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> Clone for StreamPublisher<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> JsonNotificationPublisher for StreamPublisher<S> where S: QueueStore + Send + Sync {}

#[async_trait]
impl<S> RawNotificationPublisher for StreamPublisher<S>
where
    S: QueueStore + Send + Sync,
{
    async fn publish_raw(
        &self,
        tag: &str,
        data: &str,
        descriptor: QueueDescriptor,
    ) -> Result<EntryId, BoxedError> {
        let fields = [(tag.to_owned(), data.to_owned())];
        let id = self.store.append(&descriptor, &fields).await?;

        trace!(queue = descriptor.key(), %id, "Published notification");

        Ok(id)
    }
}
