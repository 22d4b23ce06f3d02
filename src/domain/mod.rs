//! Domain specific structures, implementations, and logic

/// Default queue size for all chat related streams
///
/// It should comfortably hold the burst of entries produced while consumers are restarting.
pub(self) const QUEUE_SIZE: usize = 10_000;

/// Number of messages returned per history page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Unread counters stop increasing once they reach this value
pub const DEFAULT_UNREAD_CEILING: i32 = 100;

mod document;
mod producer;

pub mod command;
pub mod database;
pub mod event;

pub use document::*;
pub use producer::*;
