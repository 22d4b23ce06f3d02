use super::QueueDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Entity to notify other services about an event that took place
pub trait Notification: Serialize + DeserializeOwned + PartialEq + Debug {
    /// Name of the entry field which carries the serialized notification
    const TAG: &'static str;

    /// Queue on which this implementation can be sent and received
    fn queue() -> QueueDescriptor;
}
