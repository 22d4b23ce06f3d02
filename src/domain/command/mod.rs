//! Inbound real-time commands and the handlers acting on them
//!
//! Clients send JSON records discriminated by their `cmd` field. Each record is decoded into a
//! [`Command`], routed by the [`CommandDispatcher`] to its handler and may produce a response
//! record for the caller. Handlers mutate the document store and publish follow-up events
//! through the [`Producer`](super::Producer).

mod dispatcher;
mod message;
mod rooms;

#[cfg(test)]
mod fixtures;

pub use dispatcher::*;

use crate::library::BoxedError;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;

/// Payload of `message:send`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SendMessage {
    /// Message text
    pub message: String,
    /// Hex encoded room id
    pub room: String,
}

/// Payload of `message:modify`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ModifyMessage {
    /// Hex encoded message id
    pub id: String,
    /// Replacement text
    pub message: String,
}

/// Payload of `message:iine`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IineMessage {
    /// Hex encoded message id
    pub id: String,
}

/// Payload of `messages:room`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GetMessages {
    /// Hex encoded room id
    pub room: String,
    /// Hex encoded id of the oldest message already known to the caller
    #[serde(default, alias = "before")]
    pub id: Option<String>,
}

/// Payload of `rooms:enter`, addressing the room either by id or by name
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EnterRoom {
    /// Hex encoded room id
    #[serde(default)]
    pub id: Option<String>,
    /// Room name, the room is created if it does not exist
    #[serde(default)]
    pub name: Option<String>,
}

/// Payload of `rooms:read`, `rooms:open` and `rooms:close`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RoomReference {
    /// Hex encoded room id
    pub room: String,
}

/// Payload of `rooms:sort`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SortRooms {
    /// Hex encoded room ids in display order
    #[serde(rename = "roomOrder")]
    pub room_order: Vec<String>,
}

/// Closed set of commands accepted from clients
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Post a message into a room
    #[serde(rename = "message:send")]
    MessageSend(SendMessage),
    /// Edit one of the callers messages
    #[serde(rename = "message:modify")]
    MessageModify(ModifyMessage),
    /// React to a message
    #[serde(rename = "message:iine")]
    MessageIine(IineMessage),
    /// Fetch a page of the message history of a room
    #[serde(rename = "messages:room")]
    MessagesRoom(GetMessages),
    /// Join a room
    #[serde(rename = "rooms:enter")]
    RoomsEnter(EnterRoom),
    /// Mark a room as read
    #[serde(rename = "rooms:read")]
    RoomsRead(RoomReference),
    /// List the rooms of the caller
    #[serde(rename = "rooms:get")]
    RoomsGet,
    /// Save the order in which the caller wants rooms to be listed
    #[serde(rename = "rooms:sort")]
    RoomsSort(SortRooms),
    /// Show a room in the callers room list
    #[serde(rename = "rooms:open")]
    RoomsOpen(RoomReference),
    /// Hide a room from the callers room list
    #[serde(rename = "rooms:close")]
    RoomsClose(RoomReference),
}

impl Command {
    /// Value of the `cmd` field
    pub fn tag(&self) -> &'static str {
        match self {
            Command::MessageSend(_) => "message:send",
            Command::MessageModify(_) => "message:modify",
            Command::MessageIine(_) => "message:iine",
            Command::MessagesRoom(_) => "messages:room",
            Command::RoomsEnter(_) => "rooms:enter",
            Command::RoomsRead(_) => "rooms:read",
            Command::RoomsGet => "rooms:get",
            Command::RoomsSort(_) => "rooms:sort",
            Command::RoomsOpen(_) => "rooms:open",
            Command::RoomsClose(_) => "rooms:close",
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(|e| CommandError::BadRequest(e.to_string()))
    }
}

/// Reasons for a command to be rejected
#[derive(Debug, Error)]
pub enum CommandError {
    /// Payload is malformed or incomplete
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Caller is not allowed to perform the command
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// Document store or queue failed
    #[error("internal failure")]
    Internal(#[source] BoxedError),
}

impl CommandError {
    /// Whether the error has been caused by the caller rather than by the system
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CommandError::Internal(_))
    }
}

impl From<BoxedError> for CommandError {
    fn from(error: BoxedError) -> Self {
        CommandError::Internal(error)
    }
}

/// Trims surrounding whitespace and rejects empty values
fn non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, CommandError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        Err(CommandError::BadRequest(format!("{} is empty", field)))
    } else {
        Ok(trimmed)
    }
}

/// Parses a hex encoded document id
fn parse_id(field: &str, value: &str) -> Result<ObjectId, CommandError> {
    let value = non_empty(field, value)?;

    ObjectId::parse_str(value)
        .map_err(|_| CommandError::BadRequest(format!("{} is not a valid id", field)))
}
