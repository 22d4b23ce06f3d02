mod factory;
mod queue_store;

pub use factory::*;
pub use queue_store::*;
