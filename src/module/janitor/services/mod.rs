mod removal;

pub use removal::UserRemovalService;
