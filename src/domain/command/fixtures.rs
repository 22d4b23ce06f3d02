use super::CommandDispatcher;
use crate::domain::database::MockChatDatabase;
use crate::domain::event::DeliveryNotification;
use crate::domain::Producer;
use crate::library::communication::event::Notification;
use crate::library::communication::implementation::mock::{
    MockCommunicationFactory, MockQueueStore,
};
use crate::library::communication::implementation::StreamPublisher;
use crate::library::communication::CommunicationFactory;

pub type TestDispatcher = CommandDispatcher<MockChatDatabase, StreamPublisher<MockQueueStore>>;

pub fn setup() -> (MockChatDatabase, MockCommunicationFactory, TestDispatcher) {
    let database = MockChatDatabase::default();
    let factory = MockCommunicationFactory::default();
    let dispatcher = CommandDispatcher::new(
        database.clone(),
        Producer::new(factory.notification_publisher()),
    );

    (database, factory, dispatcher)
}

/// Records appended to the delivery stream so far
pub fn deliveries(factory: &MockCommunicationFactory) -> Vec<DeliveryNotification> {
    factory
        .store()
        .payloads(&DeliveryNotification::queue(), DeliveryNotification::TAG)
}
