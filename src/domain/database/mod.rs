//! Access to the document store holding users, rooms, memberships and messages
//!
//! All operations are single-document or single-filter atomic updates, the store offers no
//! further concurrency control. Consumers and command handlers depend on the [`ChatDatabase`]
//! trait only, the [`MongoChatDatabase`] is the production implementation.

mod mongo;

#[cfg(test)]
mod mock;

pub use mongo::*;

#[cfg(test)]
pub use mock::*;

use super::{Enter, Message, Removed, Room, User};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

/// Result type of all [`ChatDatabase`] operations
pub type DatabaseResult<T> = Result<T, BoxedError>;

/// Domain operations on the document store
#[async_trait]
pub trait ChatDatabase {
    /// Looks up a user by id
    async fn find_user(&self, id: &ObjectId) -> DatabaseResult<Option<User>>;

    /// Looks up multiple users at once, unknown ids are skipped
    async fn find_users(&self, ids: &[ObjectId]) -> DatabaseResult<Vec<User>>;

    /// Replaces the saved room order of a user and returns whether the user exists
    async fn set_room_order(&self, user: &ObjectId, order: &[ObjectId]) -> DatabaseResult<bool>;

    /// Deletes a user document
    async fn delete_user(&self, id: &ObjectId) -> EmptyResult;

    /// Looks up a room by id
    async fn find_room(&self, id: &ObjectId) -> DatabaseResult<Option<Room>>;

    /// Looks up multiple rooms at once, unknown ids are skipped
    async fn find_rooms(&self, ids: &[ObjectId]) -> DatabaseResult<Vec<Room>>;

    /// Returns the room with the given name, atomically creating it if it does not exist
    async fn find_or_create_room(&self, name: &str, created_by: &ObjectId) -> DatabaseResult<Room>;

    /// Adds a user to a room
    ///
    /// Re-entering keeps the counters of an existing membership and shows the room again.
    async fn enter_room(&self, user: &ObjectId, room: &ObjectId) -> EmptyResult;

    /// Looks up the membership of a user in a room
    async fn find_membership(
        &self,
        user: &ObjectId,
        room: &ObjectId,
    ) -> DatabaseResult<Option<Enter>>;

    /// All memberships of a user
    async fn memberships_of_user(&self, user: &ObjectId) -> DatabaseResult<Vec<Enter>>;

    /// Ids of all members of a room
    async fn member_ids(&self, room: &ObjectId) -> DatabaseResult<Vec<ObjectId>>;

    /// Increments the unread counter of every member of `room` whose counter is below `ceiling`,
    /// skipping the member `except`. Returns the number of modified memberships.
    async fn increment_unread(
        &self,
        room: &ObjectId,
        except: Option<&ObjectId>,
        ceiling: i32,
    ) -> DatabaseResult<u64>;

    /// Increments the read receipt counter of a single membership
    async fn increment_replied(&self, user: &ObjectId, room: &ObjectId) -> DatabaseResult<u64>;

    /// Zeroes the unread counter of a single membership
    async fn reset_unread(&self, user: &ObjectId, room: &ObjectId) -> DatabaseResult<u64>;

    /// Shows or hides a room in the members room list. Returns the number of matched memberships.
    async fn set_visibility(
        &self,
        user: &ObjectId,
        room: &ObjectId,
        show: bool,
    ) -> DatabaseResult<u64>;

    /// Deletes all memberships of a user
    async fn delete_memberships(&self, user: &ObjectId) -> DatabaseResult<u64>;

    /// Persists a new message
    async fn insert_message(&self, message: &Message) -> EmptyResult;

    /// Looks up a message by id
    async fn find_message(&self, id: &ObjectId) -> DatabaseResult<Option<Message>>;

    /// Adds a reaction to a message and returns the updated message
    async fn increment_iine(&self, id: &ObjectId) -> DatabaseResult<Option<Message>>;

    /// Replaces the text of a message and marks it as edited
    async fn update_message(
        &self,
        id: &ObjectId,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> EmptyResult;

    /// Up to `limit` messages of a room older than `before`, newest first
    async fn messages_page(
        &self,
        room: &ObjectId,
        before: Option<&ObjectId>,
        limit: usize,
    ) -> DatabaseResult<Vec<Message>>;

    /// Creates or overwrites the tombstone of a purged user, keyed by its former id
    async fn upsert_tombstone(&self, removed: &Removed) -> EmptyResult;
}
