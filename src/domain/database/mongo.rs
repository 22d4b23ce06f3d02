use super::{ChatDatabase, DatabaseResult};
use crate::domain::{Enter, Message, Removed, Room, User};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::options::{
    CreateIndexOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
    UpdateOptions,
};
use mongodb::{Collection, Database, IndexModel};
use tracing::{instrument, trace};

const COLLECTION_USERS: &str = "users";
const COLLECTION_ROOMS: &str = "rooms";
const COLLECTION_ENTER: &str = "enter";
const COLLECTION_MESSAGES: &str = "messages";
const COLLECTION_REMOVED: &str = "removed";

/// [`ChatDatabase`] implementation backed by MongoDB
#[derive(Clone)]
pub struct MongoChatDatabase {
    users: Collection<User>,
    rooms: Collection<Room>,
    enter: Collection<Enter>,
    messages: Collection<Message>,
    removed: Collection<Removed>,
}

impl MongoChatDatabase {
    /// Creates handles to all collections within the given database
    pub fn new(database: &Database) -> Self {
        Self {
            users: database.collection(COLLECTION_USERS),
            rooms: database.collection(COLLECTION_ROOMS),
            enter: database.collection(COLLECTION_ENTER),
            messages: database.collection(COLLECTION_MESSAGES),
            removed: database.collection(COLLECTION_REMOVED),
        }
    }

    /// Ensures the indices backing the uniqueness and lookup patterns exist
    #[instrument(skip(self))]
    pub async fn create_indices(&self) -> EmptyResult {
        let unique = || IndexOptions::builder().unique(true).build();

        trace!("Ensuring that the room name index exists");
        self.rooms
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
                CreateIndexOptions::default(),
            )
            .await?;

        trace!("Ensuring that the membership index exists");
        self.enter
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "userId": 1, "roomId": 1 })
                    .options(unique())
                    .build(),
                CreateIndexOptions::default(),
            )
            .await?;

        trace!("Ensuring that the message history index exists");
        self.messages
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "roomId": 1, "_id": -1 })
                    .build(),
                CreateIndexOptions::default(),
            )
            .await?;

        Ok(())
    }

    fn membership(user: &ObjectId, room: &ObjectId) -> Document {
        doc! { "userId": *user, "roomId": *room }
    }
}

#[async_trait]
impl ChatDatabase for MongoChatDatabase {
    async fn find_user(&self, id: &ObjectId) -> DatabaseResult<Option<User>> {
        Ok(self.users.find_one(doc! { "_id": *id }, None).await?)
    }

    async fn find_users(&self, ids: &[ObjectId]) -> DatabaseResult<Vec<User>> {
        let filter = doc! { "_id": { "$in": ids.to_vec() } };
        let cursor = self.users.find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_room_order(&self, user: &ObjectId, order: &[ObjectId]) -> DatabaseResult<bool> {
        let result = self
            .users
            .update_one(
                doc! { "_id": *user },
                doc! { "$set": { "roomOrder": order.to_vec() } },
                None,
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, id: &ObjectId) -> EmptyResult {
        self.users.delete_one(doc! { "_id": *id }, None).await?;
        Ok(())
    }

    async fn find_room(&self, id: &ObjectId) -> DatabaseResult<Option<Room>> {
        Ok(self.rooms.find_one(doc! { "_id": *id }, None).await?)
    }

    async fn find_rooms(&self, ids: &[ObjectId]) -> DatabaseResult<Vec<Room>> {
        let filter = doc! { "_id": { "$in": ids.to_vec() } };
        let cursor = self.rooms.find(filter, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_or_create_room(&self, name: &str, created_by: &ObjectId) -> DatabaseResult<Room> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let update = doc! {
            "$setOnInsert": {
                "createdBy": *created_by,
                "createdAt": bson::DateTime::now(),
            }
        };

        self.rooms
            .find_one_and_update(doc! { "name": name }, update, options)
            .await?
            .ok_or_else(|| BoxedError::from("room upsert returned no document"))
    }

    async fn enter_room(&self, user: &ObjectId, room: &ObjectId) -> EmptyResult {
        let update = doc! {
            "$set": { "show": true },
            "$setOnInsert": { "unreadCounter": 0, "replied": 0 },
        };
        let options = UpdateOptions::builder().upsert(true).build();

        self.enter
            .update_one(Self::membership(user, room), update, options)
            .await?;

        Ok(())
    }

    async fn find_membership(
        &self,
        user: &ObjectId,
        room: &ObjectId,
    ) -> DatabaseResult<Option<Enter>> {
        Ok(self
            .enter
            .find_one(Self::membership(user, room), None)
            .await?)
    }

    async fn memberships_of_user(&self, user: &ObjectId) -> DatabaseResult<Vec<Enter>> {
        let cursor = self.enter.find(doc! { "userId": *user }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn member_ids(&self, room: &ObjectId) -> DatabaseResult<Vec<ObjectId>> {
        let cursor = self.enter.find(doc! { "roomId": *room }, None).await?;
        let memberships: Vec<Enter> = cursor.try_collect().await?;

        Ok(memberships.into_iter().map(|enter| enter.user_id).collect())
    }

    async fn increment_unread(
        &self,
        room: &ObjectId,
        except: Option<&ObjectId>,
        ceiling: i32,
    ) -> DatabaseResult<u64> {
        let mut filter = doc! { "roomId": *room, "unreadCounter": { "$lt": ceiling } };
        if let Some(except) = except {
            filter.insert("userId", doc! { "$ne": *except });
        }

        let result = self
            .enter
            .update_many(filter, doc! { "$inc": { "unreadCounter": 1 } }, None)
            .await?;

        Ok(result.modified_count)
    }

    async fn increment_replied(&self, user: &ObjectId, room: &ObjectId) -> DatabaseResult<u64> {
        let result = self
            .enter
            .update_one(
                Self::membership(user, room),
                doc! { "$inc": { "replied": 1 } },
                None,
            )
            .await?;

        Ok(result.modified_count)
    }

    async fn reset_unread(&self, user: &ObjectId, room: &ObjectId) -> DatabaseResult<u64> {
        let result = self
            .enter
            .update_one(
                Self::membership(user, room),
                doc! { "$set": { "unreadCounter": 0 } },
                None,
            )
            .await?;

        Ok(result.matched_count)
    }

    async fn set_visibility(
        &self,
        user: &ObjectId,
        room: &ObjectId,
        show: bool,
    ) -> DatabaseResult<u64> {
        let result = self
            .enter
            .update_one(
                Self::membership(user, room),
                doc! { "$set": { "show": show } },
                None,
            )
            .await?;

        Ok(result.matched_count)
    }

    async fn delete_memberships(&self, user: &ObjectId) -> DatabaseResult<u64> {
        let result = self.enter.delete_many(doc! { "userId": *user }, None).await?;
        Ok(result.deleted_count)
    }

    async fn insert_message(&self, message: &Message) -> EmptyResult {
        self.messages.insert_one(message, None).await?;
        Ok(())
    }

    async fn find_message(&self, id: &ObjectId) -> DatabaseResult<Option<Message>> {
        Ok(self.messages.find_one(doc! { "_id": *id }, None).await?)
    }

    async fn increment_iine(&self, id: &ObjectId) -> DatabaseResult<Option<Message>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .messages
            .find_one_and_update(doc! { "_id": *id }, doc! { "$inc": { "iine": 1 } }, options)
            .await?)
    }

    async fn update_message(
        &self,
        id: &ObjectId,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> EmptyResult {
        let update = doc! {
            "$set": {
                "message": text,
                "updated": true,
                "updatedAt": bson::DateTime::from_chrono(updated_at),
            }
        };

        self.messages
            .update_one(doc! { "_id": *id }, update, None)
            .await?;

        Ok(())
    }

    async fn messages_page(
        &self,
        room: &ObjectId,
        before: Option<&ObjectId>,
        limit: usize,
    ) -> DatabaseResult<Vec<Message>> {
        let mut filter = doc! { "roomId": *room };
        if let Some(before) = before {
            filter.insert("_id", doc! { "$lt": *before });
        }

        let options = FindOptions::builder()
            .sort(doc! { "_id": -1 })
            .limit(limit as i64)
            .build();

        let cursor = self.messages.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn upsert_tombstone(&self, removed: &Removed) -> EmptyResult {
        let update = doc! { "$set": bson::to_document(removed)? };
        let options = UpdateOptions::builder().upsert(true).build();

        self.removed
            .update_many(doc! { "originId": removed.origin_id }, update, options)
            .await?;

        Ok(())
    }
}
