use crate::library::BoxedError;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Identifier of an entry within a queue, assigned by the store on append
///
/// Identifiers are strictly increasing within a single queue.
pub type EntryId = String;

/// Describes a notification queue and its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDescriptor {
    key: String,
    limit: usize,
}

impl QueueDescriptor {
    /// Creates a new instance from raw parts
    pub fn new(key: String, limit: usize) -> Self {
        Self { key, limit }
    }

    /// Value which may be used by queue implementations to identify a queue
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Approximate number of notifications to be retained in the queue
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Location within the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueLocation {
    /// Start of the queue (not necessarily the first notification as a queue is limited in length)
    Head,
    /// End of the queue (exclusive of the last message)
    Tail,
}

/// Errors concerning the contents of a [`QueueEntry`]
#[derive(Debug, Error)]
pub enum QueueEntryError {
    /// The entry carries no field with the expected tag
    #[error("payload field '{0}' missing from queue entry")]
    MissingPayload(String),
}

/// Entry retrieved from a [`Queue`](QueueDescriptor) providing raw field access
pub trait RawQueueEntry {
    /// Identifier assigned by the store
    fn id(&self) -> &str;

    /// Ordered field/value pairs stored with the entry
    fn fields(&self) -> &[(String, String)];

    /// Value of the first field named `tag`
    fn payload(&self, tag: &str) -> Option<&str> {
        self.fields()
            .iter()
            .find(|(key, _)| key == tag)
            .map(|(_, value)| value.as_str())
    }
}

/// Useful functions for [`QueueEntry`] implementations with default implementations
pub trait QueueEntry: RawQueueEntry {
    /// Attempts to parse the wire-format payload stored under `tag` into a given data structure
    fn parse_payload<T>(&self, tag: &str) -> Result<T, BoxedError>
    where
        T: DeserializeOwned;
}

/// Immutable entry as it is stored in a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    id: EntryId,
    fields: Vec<(String, String)>,
}

impl StreamEntry {
    /// Creates a new instance from raw parts
    pub fn new(id: EntryId, fields: Vec<(String, String)>) -> Self {
        Self { id, fields }
    }
}

impl RawQueueEntry for StreamEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}
