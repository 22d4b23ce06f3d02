use super::MockQueueStore;
use crate::library::communication::implementation::StreamPublisher;
use crate::library::communication::CommunicationFactory;
use std::sync::Arc;

/// [`CommunicationFactory`] handing out views onto one shared [`MockQueueStore`]
#[derive(Default, Clone)]
pub struct MockCommunicationFactory {
    store: Arc<MockQueueStore>,
}

impl MockCommunicationFactory {
    /// Store backing every instance created by this factory
    pub fn store(&self) -> &MockQueueStore {
        &self.store
    }
}

impl CommunicationFactory for MockCommunicationFactory {
    type QueueStore = Arc<MockQueueStore>;
    type NotificationPublisher = StreamPublisher<MockQueueStore>;

    fn queue_store(&self) -> Self::QueueStore {
        self.store.clone()
    }

    fn notification_publisher(&self) -> Self::NotificationPublisher {
        StreamPublisher::new(self.store.clone())
    }
}
