use crate::domain::database::ChatDatabase;
use crate::domain::event::ReplyNotification;
use crate::harness::Service;
use crate::library::communication::event::Consumer;
use crate::library::communication::CommunicationFactory;
use crate::library::EmptyResult;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tracing::{debug, warn};

/// Records read receipts on the membership of the reading user
///
/// Not idempotent, a redelivered receipt is counted twice.
pub struct ReplyCounterService<D> {
    database: D,
}

impl<F, D> Service<F> for ReplyCounterService<D>
where
    F: CommunicationFactory + Send + Sync,
    D: ChatDatabase + Clone + Send + Sync,
{
    const NAME: &'static str = "ReplyCounterService";

    type Config = D;

    fn instantiate(_factory: F, database: &Self::Config) -> Self {
        Self {
            database: database.clone(),
        }
    }
}

#[async_trait]
impl<D> Consumer for ReplyCounterService<D>
where
    D: ChatDatabase + Send + Sync,
{
    type Notification = ReplyNotification;

    async fn consume(&self, notification: Self::Notification) -> EmptyResult {
        let room = ObjectId::parse_str(&notification.room_id)?;
        let user = ObjectId::parse_str(&notification.user_id)?;

        if self.database.increment_replied(&user, &room).await? == 0 {
            warn!(%user, %room, "Read receipt for unknown membership");
        } else {
            debug!(%user, %room, "Recorded read receipt");
        }

        Ok(())
    }
}
