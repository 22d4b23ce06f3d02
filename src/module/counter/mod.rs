//! Maintains the unread and read receipt counters of room memberships

mod options;
mod services;

use crate::domain::database::MongoChatDatabase;
use crate::harness::{Heart, Module, ServiceRunner};
use crate::library::communication::event::{
    ConsumerGroupDescriptor, ConsumerGroupIdentifier, QueueLocation,
};
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use jatsl::{schedule, JobScheduler};

pub use options::Options;
use services::*;
use tracing::{debug, instrument};

/// Module implementation
pub struct Counter {
    options: Options,
    database: Option<MongoChatDatabase>,
}

impl Counter {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            database: None,
        }
    }
}

#[async_trait]
impl Module for Counter {
    #[instrument(skip(self))]
    async fn pre_startup(&mut self) -> EmptyResult {
        debug!("Acquiring mongo connection");
        self.database = Some(self.options.mongo.database().await?);
        Ok(())
    }

    #[instrument(skip(self, scheduler))]
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let redis_url = self.options.redis.url.clone();
        let consumer = self.options.queueing.id.clone();
        let consumption = self.options.consumer.consumption();

        let database = self
            .database
            .clone()
            .ok_or("document store has not been connected")?;

        let unread_group =
            ConsumerGroupDescriptor::new(ConsumerGroupIdentifier::Unread, QueueLocation::Head);
        let reply_group =
            ConsumerGroupDescriptor::new(ConsumerGroupIdentifier::Reply, QueueLocation::Head);

        let unread_counter = ServiceRunner::<UnreadCounterService<MongoChatDatabase>>::new(
            redis_url.clone(),
            unread_group,
            consumer.clone(),
            (database.clone(), self.options.unread_ceiling()),
        )
        .with_options(consumption.clone());

        let reply_counter = ServiceRunner::<ReplyCounterService<MongoChatDatabase>>::new(
            redis_url,
            reply_group,
            consumer,
            database,
        )
        .with_options(consumption);

        debug!("Scheduling jobs");
        schedule!(scheduler, { unread_counter, reply_counter });

        Ok(Some(Heart::new()))
    }
}
