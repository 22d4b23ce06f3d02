//! Serialization and deserialization provided by [`serde_json`] using marker traits
//!
//! This module allows implementors of traits that allow raw access to underlying messaging systems
//! to provide the higher-level traits relying on serialization. It does so by providing a number of
//! marker traits which, when implemented, provide default implementations of the higher-level traits
//! by translating between lower-level serialized data and higher-level strongly typed data by using
//! [`serde_json`].

use super::super::event::{
    EntryId, Notification, NotificationPublisher, QueueEntry, QueueEntryError,
    RawNotificationPublisher, RawQueueEntry, StreamEntry,
};
use crate::library::BoxedError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Marker trait providing a default [`NotificationPublisher`] implementation based on [`serde_json`]
pub trait JsonNotificationPublisher: RawNotificationPublisher + Send + Sync {}

#[async_trait]
impl<P> NotificationPublisher for P
where
    P: JsonNotificationPublisher,
{
    /// Serializes the notification using [`serde_json::to_string`]
    async fn publish<N: Notification + Send + Sync>(
        &self,
        notification: &N,
    ) -> Result<EntryId, BoxedError> {
        let data = serde_json::to_string(notification)?;
        self.publish_raw(N::TAG, &data, N::queue()).await
    }
}

/// Marker trait providing a default [`QueueEntry`] implementation based on [`serde_json`]
pub trait JsonQueueEntry: RawQueueEntry {}

impl<E> QueueEntry for E
where
    E: JsonQueueEntry,
{
    /// Parses the payload using [`serde_json::from_str`]
    ///
    /// Values which are not valid JSON are handed to the deserializer as a plain string so that
    /// entries written by producers emitting bare scalars remain readable.
    fn parse_payload<T>(&self, tag: &str) -> Result<T, BoxedError>
    where
        T: DeserializeOwned,
    {
        let payload = self
            .payload(tag)
            .ok_or_else(|| QueueEntryError::MissingPayload(tag.to_owned()))?;

        match serde_json::from_str(payload) {
            Ok(value) => Ok(value),
            Err(error) => serde_json::from_value(Value::String(payload.to_owned()))
                .map_err(|_| error.into()),
        }
    }
}

impl JsonQueueEntry for StreamEntry {}
