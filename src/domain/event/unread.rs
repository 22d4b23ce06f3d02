use super::super::QUEUE_SIZE;
use crate::library::communication::event::{Notification, QueueDescriptor};
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "stream:unread";

/// New message has been posted into a room
///
/// Every member of the room except for the optional sender gets their unread counter bumped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnreadNotification {
    /// Hex encoded id of the room
    pub room_id: String,

    /// Hex encoded id of the member whose counter stays untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Notification for UnreadNotification {
    const TAG: &'static str = "unread";

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(QUEUE_KEY.into(), QUEUE_SIZE)
    }
}
