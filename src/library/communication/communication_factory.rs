use super::event::{NotificationPublisher, QueueStore};

/// Factory to provide implementations for the traits from this module
pub trait CommunicationFactory {
    /// [`QueueStore`] implementation type
    type QueueStore: QueueStore + Send + Sync;
    /// [`NotificationPublisher`] implementation type
    type NotificationPublisher: NotificationPublisher + Send + Sync;

    /// Instantiates a new [`QueueStore`]
    fn queue_store(&self) -> Self::QueueStore;
    /// Instantiates a new [`NotificationPublisher`]
    fn notification_publisher(&self) -> Self::NotificationPublisher;
}
