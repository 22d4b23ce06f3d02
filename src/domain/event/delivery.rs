use super::super::QUEUE_SIZE;
use crate::library::communication::event::{Notification, QueueDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "stream:message";

/// Chat message as it is presented to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    /// Hex encoded message id
    pub id: String,
    /// Hex encoded id of the author
    pub user_id: String,
    /// Account name of the author, absent if the account no longer exists
    pub user_account: Option<String>,
    /// Message text
    pub message: String,
    /// Number of reactions
    pub iine: i32,
    /// Whether the message has been edited
    pub updated: bool,
    /// Time of creation
    pub created_at: DateTime<Utc>,
    /// Time of the last edit
    pub updated_at: Option<DateTime<Utc>>,
}

/// Room membership as it is presented to its member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    /// Hex encoded room id
    pub id: String,
    /// Display name
    pub name: String,
    /// Messages posted since the member last read the room
    pub unread: i32,
    /// Read receipts recorded for the member
    pub replied: i32,
    /// Whether the room is shown in the members room list
    pub show: bool,
}

/// Outbound event for a connected client, discriminated by `cmd`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd")]
pub enum DeliveryEvent {
    /// New message in a room
    #[serde(rename = "message:receive")]
    MessageReceive {
        /// Posted message
        message: MessageView,
        /// Hex encoded room id
        room: String,
    },
    /// Existing message has been edited
    #[serde(rename = "message:modify")]
    MessageModify {
        /// Edited message
        message: MessageView,
        /// Hex encoded room id
        room: String,
    },
    /// Reaction count of a message changed
    #[serde(rename = "message:iine")]
    MessageIine {
        /// New reaction count
        iine: i32,
        /// Hex encoded room id
        room: String,
        /// Hex encoded message id
        id: String,
    },
    /// Page of the message history of a room, newest first
    #[serde(rename = "messages:room")]
    MessagesRoom {
        /// Hex encoded room id
        room: String,
        /// Messages of the page
        messages: Vec<MessageView>,
        /// Whether older messages are available
        #[serde(rename = "existHistory")]
        exist_history: bool,
    },
    /// Caller has entered a room
    #[serde(rename = "rooms:enter:success")]
    RoomsEnterSuccess {
        /// Hex encoded room id
        id: String,
        /// Display name
        name: String,
    },
    /// Caller has read a room
    #[serde(rename = "rooms:read")]
    RoomsRead {
        /// Hex encoded room id
        room: String,
    },
    /// Rooms the caller is a member of
    #[serde(rename = "rooms")]
    Rooms {
        /// Memberships of the caller
        rooms: Vec<RoomView>,
        /// Order of rooms saved by the caller
        #[serde(rename = "roomOrder")]
        room_order: Vec<String>,
    },
    /// Caller saved a new room order
    #[serde(rename = "rooms:sort")]
    RoomsSort {
        /// Hex encoded room ids in display order
        #[serde(rename = "roomOrder")]
        room_order: Vec<String>,
    },
    /// Room has been put back into the callers room list
    #[serde(rename = "rooms:open")]
    RoomsOpen {
        /// Hex encoded room id
        room: String,
    },
    /// Room has been hidden from the callers room list
    #[serde(rename = "rooms:close")]
    RoomsClose {
        /// Hex encoded room id
        room: String,
    },
}

/// Entry of the shared delivery stream, addressed to a single user
///
/// Socket gateways read this stream and forward each entry to the connections of `user`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryNotification {
    /// Hex encoded id of the recipient
    pub user: Option<String>,

    /// Event to deliver
    #[serde(flatten)]
    pub event: DeliveryEvent,
}

impl DeliveryNotification {
    /// Creates a new instance addressed to the given user
    pub fn new(user: impl Into<String>, event: DeliveryEvent) -> Self {
        Self {
            user: Some(user.into()),
            event,
        }
    }
}

impl Notification for DeliveryNotification {
    const TAG: &'static str = "message";

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(QUEUE_KEY.into(), QUEUE_SIZE)
    }
}
