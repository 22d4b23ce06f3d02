mod reply;
mod unread;

pub use reply::ReplyCounterService;
pub use unread::UnreadCounterService;
