use super::super::QUEUE_SIZE;
use crate::library::communication::event::{Notification, QueueDescriptor};
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "stream:reply";

/// Member has read a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyNotification {
    /// Hex encoded id of the room
    pub room_id: String,
    /// Hex encoded id of the reading member
    pub user_id: String,
}

impl Notification for ReplyNotification {
    const TAG: &'static str = "reply";

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(QUEUE_KEY.into(), QUEUE_SIZE)
    }
}
