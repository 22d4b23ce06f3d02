//! Domain specific [`Notification`](crate::library::communication::event::Notification) structures

mod delivery;
mod removal;
mod reply;
mod unread;

pub use delivery::*;
pub use removal::*;
pub use reply::*;
pub use unread::*;
