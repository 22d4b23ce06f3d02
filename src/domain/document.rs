//! Documents persisted in the document store

use super::event::{MessageView, RoomView};
use crate::library::helpers::option_chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// Chat user account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Account name
    pub account: String,

    /// Order in which the user wants rooms to be listed
    #[serde(default)]
    pub room_order: Vec<ObjectId>,
}

/// Chat room
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Unique display name
    pub name: String,

    /// User who created the room
    pub created_by: Option<ObjectId>,

    /// Time at which the room was created
    #[serde(default, with = "option_chrono_datetime_as_bson_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Membership of a user in a room, named after the act of entering it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enter {
    /// Member
    pub user_id: ObjectId,

    /// Room
    pub room_id: ObjectId,

    /// Messages posted since the member last read the room
    #[serde(default)]
    pub unread_counter: i32,

    /// Read receipts recorded for the member
    #[serde(default)]
    pub replied: i32,

    /// Whether the room is shown in the members room list
    #[serde(default = "default_show")]
    pub show: bool,
}

fn default_show() -> bool {
    true
}

impl Enter {
    /// Creates a fresh membership with zeroed counters
    pub fn new(user_id: ObjectId, room_id: ObjectId) -> Self {
        Self {
            user_id,
            room_id,
            unread_counter: 0,
            replied: 0,
            show: true,
        }
    }

    /// Client representation of the membership
    pub fn view(&self, room: &Room) -> RoomView {
        RoomView {
            id: room.id.to_hex(),
            name: room.name.clone(),
            unread: self.unread_counter,
            replied: self.replied,
            show: self.show,
        }
    }
}

/// Message posted into a room
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// Room the message has been posted into
    pub room_id: ObjectId,

    /// Author
    pub user_id: ObjectId,

    /// Message text
    pub message: String,

    /// Number of reactions
    #[serde(default)]
    pub iine: i32,

    /// Whether the message has been edited
    #[serde(default)]
    pub updated: bool,

    /// Time of creation
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    /// Time of the last edit
    #[serde(default, with = "option_chrono_datetime_as_bson_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates a new, unedited message
    pub fn new(room_id: ObjectId, user_id: ObjectId, message: String) -> Self {
        Self {
            id: ObjectId::new(),
            room_id,
            user_id,
            message,
            iine: 0,
            updated: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Client representation of the message
    pub fn view(&self, user_account: Option<String>) -> MessageView {
        MessageView {
            id: self.id.to_hex(),
            user_id: self.user_id.to_hex(),
            user_account,
            message: self.message.clone(),
            iine: self.iine,
            updated: self.updated,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Tombstone retained after a user account has been purged
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Removed {
    /// Account name of the purged user
    pub account: String,

    /// Former identifier of the purged user
    pub origin_id: ObjectId,

    /// Rooms the user was a member of
    pub enter: Vec<ObjectId>,
}
