use super::event::{
    DeliveryEvent, DeliveryNotification, ReplyNotification, UnreadNotification,
};
use crate::library::communication::event::{EntryId, NotificationPublisher};
use crate::library::BoxedError;
use futures::future::try_join_all;
use tracing::{debug, instrument};

/// Typed helpers appending domain events to their streams
///
/// Producers never wait for consumers, each call returns as soon as the store accepted the entries.
#[derive(Clone)]
pub struct Producer<P> {
    publisher: P,
}

impl<P> Producer<P>
where
    P: NotificationPublisher + Send + Sync,
{
    /// Creates a new instance publishing through the given publisher
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }

    /// Appends a single record to the delivery stream
    pub async fn add_message_queue(
        &self,
        notification: &DeliveryNotification,
    ) -> Result<EntryId, BoxedError> {
        self.publisher.publish(notification).await
    }

    /// Fans an event out to the delivery stream, once per recipient with `user` bound to it
    ///
    /// All appends are awaited, the first failure is returned.
    #[instrument(skip(self, users, event), fields(recipients = users.len()))]
    pub async fn add_queue_to_users<U>(
        &self,
        users: &[U],
        event: &DeliveryEvent,
    ) -> Result<Vec<EntryId>, BoxedError>
    where
        U: ToString,
    {
        let notifications: Vec<DeliveryNotification> = users
            .iter()
            .map(|user| DeliveryNotification::new(user.to_string(), event.clone()))
            .collect();

        let ids = try_join_all(
            notifications
                .iter()
                .map(|notification| self.publisher.publish(notification)),
        )
        .await?;

        debug!("Fanned out delivery event");
        Ok(ids)
    }

    /// Requests the unread counters of a room to be bumped, leaving out `user` if given
    pub async fn add_unread_queue(
        &self,
        room: &str,
        user: Option<&str>,
    ) -> Result<EntryId, BoxedError> {
        let notification = UnreadNotification {
            room_id: room.to_owned(),
            user_id: user.map(ToOwned::to_owned),
        };

        self.publisher.publish(&notification).await
    }

    /// Records a read receipt of `user` in `room`
    pub async fn add_replied_queue(&self, room: &str, user: &str) -> Result<EntryId, BoxedError> {
        let notification = ReplyNotification {
            room_id: room.to_owned(),
            user_id: user.to_owned(),
        };

        self.publisher.publish(&notification).await
    }
}
