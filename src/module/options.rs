//! Various options usable by modules
//!
//! The structs in this module allow other modules to flatten them into
//! their own options struct. This allows for a unified yet non-cluttered
//! option set.

use crate::domain::database::MongoChatDatabase;
use crate::library::communication::event::ConsumptionOptions;
use crate::library::helpers::{parse_millis, parse_seconds};
use crate::library::BoxedError;
use mongodb::Client;
use std::time::Duration;
use structopt::StructOpt;
use tracing::{debug, instrument};

/// Options for connecting to the Redis server
#[derive(Debug, StructOpt)]
pub struct RedisOptions {
    /// Redis database server URL
    #[structopt(
        short = "r",
        long = "redis",
        env = "REDIS",
        global = true,
        default_value = "redis://localhost/",
        value_name = "url"
    )]
    pub url: String,
}

/// Options relevant for message queueing
#[derive(Debug, StructOpt)]
pub struct QueueingOptions {
    /// Unique and stable identifier for this instance.
    /// It is used to identify and resume work after a crash
    /// or deliberate restart, thus it may not change across
    /// executions!
    #[structopt(env)]
    pub id: String,
}

/// Options regarding the document store
#[derive(Debug, StructOpt)]
pub struct MongoDBOptions {
    /// MongoDB connection URL
    #[structopt(long, env)]
    mongodb: String,

    /// Name of the database to use
    #[structopt(long, env, default_value = "chat")]
    database: String,
}

impl MongoDBOptions {
    /// Connects to the document store and ensures that all required indices exist
    #[instrument(skip(self), fields(database = %self.database))]
    pub async fn database(&self) -> Result<MongoChatDatabase, BoxedError> {
        let client = Client::with_uri_str(&self.mongodb).await?;
        let database = MongoChatDatabase::new(&client.database(&self.database));

        debug!("Creating indices");
        database.create_indices().await?;

        Ok(database)
    }
}

/// Redis reads with a zero timeout would block indefinitely
const MIN_BLOCK_TIMEOUT: Duration = Duration::from_millis(1);

/// Tuning parameters of the stream consumers
#[derive(Debug, StructOpt)]
pub struct ConsumerOptions {
    /// Maximum time in milliseconds a read waits for new entries
    #[structopt(long, env, default_value = "5000", parse(try_from_str = parse_millis), value_name = "ms")]
    pub block_timeout: Duration,

    /// Maximum number of entries processed per read
    #[structopt(long, env, default_value = "1")]
    pub batch_size: usize,

    /// Seconds to wait before retrying after the stream server could not be reached
    #[structopt(long, env, default_value = "1", parse(try_from_str = parse_seconds), value_name = "s")]
    pub retry_interval: Duration,
}

impl ConsumerOptions {
    /// Options for the consumption loop
    pub fn consumption(&self) -> ConsumptionOptions {
        ConsumptionOptions {
            batch_size: self.batch_size.max(1),
            block: self.block_timeout.max(MIN_BLOCK_TIMEOUT),
            retry_interval: self.retry_interval,
        }
    }
}
