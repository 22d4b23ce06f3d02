//! Structures to realise an event-driven service architecture
//!
//! In an event driven world, producers have no knowledge of their consumers.
//! Whenever an event of relevance to other parts of the system occurs, a
//! [`Notification`] is published onto its [`Queue`](QueueDescriptor).
//! Every interested party may then subscribe to that queue and process them. While processing,
//! it is common that other events are triggered and thus further notifications published.
//!
//! Notifications are consumed in a reliable and resilient way using a concept called
//! [`ConsumerGroups`](ConsumerGroupDescriptor). Instead of using simple publish subscribe,
//! messages are stored in a log-like data structure (usually of limited length where old elements are evicted).
//!
//! All notifications have to be acknowledged once processing concludes. Upon crashing, the
//! [`Consumer`](ConsumerIdentifier) first works through everything it received but never acknowledged
//! before moving on to new entries. This ensures that no [`QueueEntries`](QueueEntry) are left
//! unprocessed, at the cost of occasionally processing one twice.
//!
//! Multiple [`Consumers`](ConsumerIdentifier) may share a [`ConsumerGroup`](ConsumerGroupDescriptor).
//! All participants in a group then collectively process the incoming notification stream where each
//! notification is assigned to only one consumer within the group.

mod consumer;
mod consumer_group;
mod notification;
mod publisher;
mod queue;
mod queue_store;

pub use consumer::*;
pub use consumer_group::*;
pub use notification::*;
pub use publisher::*;
pub use queue::*;
pub use queue_store::*;
