use super::super::QUEUE_SIZE;
use crate::library::communication::event::{Notification, QueueDescriptor};
use serde::{Deserialize, Serialize};

const QUEUE_KEY: &str = "stream:remove:user:chat";

/// User account has been deleted and its chat data should be purged
///
/// The account service writes the bare hex id as the field value, the `{"userId": …}` record
/// is accepted as well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "RemovalPayload")]
pub struct UserRemovalNotification {
    /// Hex encoded id of the removed user
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RemovalPayload {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Record {
        user_id: String,
    },
}

impl From<RemovalPayload> for UserRemovalNotification {
    fn from(payload: RemovalPayload) -> Self {
        let user_id = match payload {
            RemovalPayload::Bare(user_id) | RemovalPayload::Record { user_id } => user_id,
        };

        Self { user_id }
    }
}

impl Notification for UserRemovalNotification {
    const TAG: &'static str = "user";

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new(QUEUE_KEY.into(), QUEUE_SIZE)
    }
}
