//! Trait implementations using [`redis`](::redis)

const STREAM_ID_NEW: &str = "*";
const STREAM_ID_HEAD: &str = "0";
const STREAM_ID_TAIL: &str = "$";
const STREAM_ID_ADDITIONS: &str = ">";

const ERROR_CODE_GROUP_EXISTS: &str = "BUSYGROUP";
const ERROR_CODE_NO_GROUP: &str = "NOGROUP";

mod factory;
mod queue_store;

pub use factory::*;
pub use queue_store::*;
