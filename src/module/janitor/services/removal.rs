use crate::domain::database::ChatDatabase;
use crate::domain::event::UserRemovalNotification;
use crate::domain::Removed;
use crate::harness::Service;
use crate::library::communication::event::Consumer;
use crate::library::communication::CommunicationFactory;
use crate::library::EmptyResult;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tracing::{debug, info};

/// Purges the chat data of deleted user accounts, leaving a tombstone behind
///
/// The tombstone is written before anything is deleted and memberships are removed last. Memberships
/// are also removed when the user is already gone, which completes a removal that was interrupted
/// after the user document had been deleted.
pub struct UserRemovalService<D> {
    database: D,
}

impl<F, D> Service<F> for UserRemovalService<D>
where
    F: CommunicationFactory + Send + Sync,
    D: ChatDatabase + Clone + Send + Sync,
{
    const NAME: &'static str = "UserRemovalService";

    type Config = D;

    fn instantiate(_factory: F, database: &Self::Config) -> Self {
        Self {
            database: database.clone(),
        }
    }
}

#[async_trait]
impl<D> Consumer for UserRemovalService<D>
where
    D: ChatDatabase + Send + Sync,
{
    type Notification = UserRemovalNotification;

    async fn consume(&self, notification: Self::Notification) -> EmptyResult {
        let id = ObjectId::parse_str(&notification.user_id)?;

        let user = match self.database.find_user(&id).await? {
            Some(user) => user,
            None => {
                let memberships = self.database.delete_memberships(&id).await?;
                debug!(user = %id, memberships, "User has already been removed");
                return Ok(());
            }
        };

        let enter = self
            .database
            .memberships_of_user(&id)
            .await?
            .into_iter()
            .map(|membership| membership.room_id)
            .collect();

        let tombstone = Removed {
            account: user.account,
            origin_id: user.id,
            enter,
        };

        self.database.upsert_tombstone(&tombstone).await?;
        self.database.delete_user(&id).await?;
        let memberships = self.database.delete_memberships(&id).await?;

        info!(user = %id, account = %tombstone.account, memberships, "Removed user");
        Ok(())
    }
}
