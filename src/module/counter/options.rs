use crate::domain::DEFAULT_UNREAD_CEILING;
use crate::module::options::{ConsumerOptions, MongoDBOptions, QueueingOptions, RedisOptions};
use structopt::StructOpt;

/// Options for the counter module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub queueing: QueueingOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub redis: RedisOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub mongo: MongoDBOptions,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub consumer: ConsumerOptions,

    /// Unread counters are not incremented beyond this value
    #[structopt(long, env, default_value = "100")]
    pub unread_ceiling: i32,
}

impl Options {
    /// Ceiling for unread counters, falling back to the default for non-positive values
    pub fn unread_ceiling(&self) -> i32 {
        if self.unread_ceiling > 0 {
            self.unread_ceiling
        } else {
            DEFAULT_UNREAD_CEILING
        }
    }
}
