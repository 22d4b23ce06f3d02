use super::{ChatDatabase, DatabaseResult};
use crate::domain::{Enter, Message, Removed, Room, User};
use crate::library::EmptyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    users: Vec<User>,
    rooms: Vec<Room>,
    enter: Vec<Enter>,
    messages: Vec<Message>,
    removed: Vec<Removed>,
}

/// In-memory [`ChatDatabase`] whose clones share their state
#[derive(Default, Clone)]
pub struct MockChatDatabase {
    state: Arc<Mutex<MockState>>,
}

impl MockChatDatabase {
    pub fn insert_user(&self, account: &str) -> ObjectId {
        let id = ObjectId::new();
        self.state.lock().unwrap().users.push(User {
            id,
            account: account.to_owned(),
            room_order: Vec::new(),
        });
        id
    }

    pub fn insert_room(&self, name: &str) -> ObjectId {
        let id = ObjectId::new();
        self.state.lock().unwrap().rooms.push(Room {
            id,
            name: name.to_owned(),
            created_by: None,
            created_at: None,
        });
        id
    }

    pub fn insert_membership(&self, enter: Enter) {
        self.state.lock().unwrap().enter.push(enter);
    }

    pub fn user(&self, id: &ObjectId) -> Option<User> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|user| user.id == *id)
            .cloned()
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.state.lock().unwrap().rooms.clone()
    }

    pub fn membership(&self, user: &ObjectId, room: &ObjectId) -> Option<Enter> {
        self.state
            .lock()
            .unwrap()
            .enter
            .iter()
            .find(|enter| enter.user_id == *user && enter.room_id == *room)
            .cloned()
    }

    pub fn memberships(&self) -> Vec<Enter> {
        self.state.lock().unwrap().enter.clone()
    }

    pub fn message(&self, id: &ObjectId) -> Option<Message> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .find(|message| message.id == *id)
            .cloned()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn tombstones(&self) -> Vec<Removed> {
        self.state.lock().unwrap().removed.clone()
    }

    fn update_membership<F>(&self, user: &ObjectId, room: &ObjectId, update: F) -> u64
    where
        F: FnOnce(&mut Enter),
    {
        let mut state = self.state.lock().unwrap();
        match state
            .enter
            .iter_mut()
            .find(|enter| enter.user_id == *user && enter.room_id == *room)
        {
            Some(enter) => {
                update(enter);
                1
            }
            None => 0,
        }
    }
}

#[async_trait]
impl ChatDatabase for MockChatDatabase {
    async fn find_user(&self, id: &ObjectId) -> DatabaseResult<Option<User>> {
        Ok(self.user(id))
    }

    async fn find_users(&self, ids: &[ObjectId]) -> DatabaseResult<Vec<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn set_room_order(&self, user: &ObjectId, order: &[ObjectId]) -> DatabaseResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.users.iter_mut().find(|u| u.id == *user) {
            Some(user) => {
                user.room_order = order.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &ObjectId) -> EmptyResult {
        self.state.lock().unwrap().users.retain(|user| user.id != *id);
        Ok(())
    }

    async fn find_room(&self, id: &ObjectId) -> DatabaseResult<Option<Room>> {
        let state = self.state.lock().unwrap();
        Ok(state.rooms.iter().find(|room| room.id == *id).cloned())
    }

    async fn find_rooms(&self, ids: &[ObjectId]) -> DatabaseResult<Vec<Room>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rooms
            .iter()
            .filter(|room| ids.contains(&room.id))
            .cloned()
            .collect())
    }

    async fn find_or_create_room(&self, name: &str, created_by: &ObjectId) -> DatabaseResult<Room> {
        let mut state = self.state.lock().unwrap();

        if let Some(room) = state.rooms.iter().find(|room| room.name == name) {
            return Ok(room.clone());
        }

        let room = Room {
            id: ObjectId::new(),
            name: name.to_owned(),
            created_by: Some(*created_by),
            created_at: Some(Utc::now()),
        };
        state.rooms.push(room.clone());

        Ok(room)
    }

    async fn enter_room(&self, user: &ObjectId, room: &ObjectId) -> EmptyResult {
        if self.update_membership(user, room, |enter| enter.show = true) == 0 {
            self.insert_membership(Enter::new(*user, *room));
        }
        Ok(())
    }

    async fn find_membership(
        &self,
        user: &ObjectId,
        room: &ObjectId,
    ) -> DatabaseResult<Option<Enter>> {
        Ok(self.membership(user, room))
    }

    async fn memberships_of_user(&self, user: &ObjectId) -> DatabaseResult<Vec<Enter>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enter
            .iter()
            .filter(|enter| enter.user_id == *user)
            .cloned()
            .collect())
    }

    async fn member_ids(&self, room: &ObjectId) -> DatabaseResult<Vec<ObjectId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enter
            .iter()
            .filter(|enter| enter.room_id == *room)
            .map(|enter| enter.user_id)
            .collect())
    }

    async fn increment_unread(
        &self,
        room: &ObjectId,
        except: Option<&ObjectId>,
        ceiling: i32,
    ) -> DatabaseResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut modified = 0;

        for enter in state.enter.iter_mut() {
            if enter.room_id == *room
                && enter.unread_counter < ceiling
                && Some(&enter.user_id) != except
            {
                enter.unread_counter += 1;
                modified += 1;
            }
        }

        Ok(modified)
    }

    async fn increment_replied(&self, user: &ObjectId, room: &ObjectId) -> DatabaseResult<u64> {
        Ok(self.update_membership(user, room, |enter| enter.replied += 1))
    }

    async fn reset_unread(&self, user: &ObjectId, room: &ObjectId) -> DatabaseResult<u64> {
        Ok(self.update_membership(user, room, |enter| enter.unread_counter = 0))
    }

    async fn set_visibility(
        &self,
        user: &ObjectId,
        room: &ObjectId,
        show: bool,
    ) -> DatabaseResult<u64> {
        Ok(self.update_membership(user, room, |enter| enter.show = show))
    }

    async fn delete_memberships(&self, user: &ObjectId) -> DatabaseResult<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.enter.len();
        state.enter.retain(|enter| enter.user_id != *user);
        Ok((before - state.enter.len()) as u64)
    }

    async fn insert_message(&self, message: &Message) -> EmptyResult {
        self.state.lock().unwrap().messages.push(message.clone());
        Ok(())
    }

    async fn find_message(&self, id: &ObjectId) -> DatabaseResult<Option<Message>> {
        Ok(self.message(id))
    }

    async fn increment_iine(&self, id: &ObjectId) -> DatabaseResult<Option<Message>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .messages
            .iter_mut()
            .find(|message| message.id == *id)
            .map(|message| {
                message.iine += 1;
                message.clone()
            }))
    }

    async fn update_message(
        &self,
        id: &ObjectId,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> EmptyResult {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.messages.iter_mut().find(|message| message.id == *id) {
            message.message = text.to_owned();
            message.updated = true;
            message.updated_at = Some(updated_at);
        }
        Ok(())
    }

    async fn messages_page(
        &self,
        room: &ObjectId,
        before: Option<&ObjectId>,
        limit: usize,
    ) -> DatabaseResult<Vec<Message>> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|message| message.room_id == *room)
            .filter(|message| match before {
                Some(before) => message.id.bytes() < before.bytes(),
                None => true,
            })
            .cloned()
            .collect();

        messages.sort_by(|a, b| b.id.bytes().cmp(&a.id.bytes()));
        messages.truncate(limit);

        Ok(messages)
    }

    async fn upsert_tombstone(&self, removed: &Removed) -> EmptyResult {
        let mut state = self.state.lock().unwrap();
        state
            .removed
            .retain(|tombstone| tombstone.origin_id != removed.origin_id);
        state.removed.push(removed.clone());
        Ok(())
    }
}
