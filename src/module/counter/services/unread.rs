use crate::domain::database::ChatDatabase;
use crate::domain::event::UnreadNotification;
use crate::harness::Service;
use crate::library::communication::event::Consumer;
use crate::library::communication::CommunicationFactory;
use crate::library::EmptyResult;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tracing::debug;

/// Bumps the unread counters of all members of a room a message has been posted into
///
/// Counters stop at a ceiling. Redelivered entries are counted again, the ceiling bounds the error.
pub struct UnreadCounterService<D> {
    database: D,
    ceiling: i32,
}

impl<F, D> Service<F> for UnreadCounterService<D>
where
    F: CommunicationFactory + Send + Sync,
    D: ChatDatabase + Clone + Send + Sync,
{
    const NAME: &'static str = "UnreadCounterService";

    type Config = (D, i32);

    fn instantiate(_factory: F, (database, ceiling): &Self::Config) -> Self {
        Self {
            database: database.clone(),
            ceiling: *ceiling,
        }
    }
}

#[async_trait]
impl<D> Consumer for UnreadCounterService<D>
where
    D: ChatDatabase + Send + Sync,
{
    type Notification = UnreadNotification;

    async fn consume(&self, notification: Self::Notification) -> EmptyResult {
        let room = ObjectId::parse_str(&notification.room_id)?;
        let sender = match &notification.user_id {
            Some(user) => Some(ObjectId::parse_str(user)?),
            None => None,
        };

        let modified = self
            .database
            .increment_unread(&room, sender.as_ref(), self.ceiling)
            .await?;

        debug!(%room, modified, "Incremented unread counters");
        Ok(())
    }
}
