//! Purges the chat data of user accounts which have been deleted

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
pub struct Janitor {
    options: Options,
    database: Option<MongoChatDatabase>,
}

impl Janitor {
    /// Creates a new instance from raw parts
    pub fn new(options: Options) -> Self {
        Self {
            options,
            database: None,
        }
    }
}

#[async_trait]
impl Module for Janitor {
    #[instrument(skip(self))]
    async fn pre_startup(&mut self) -> EmptyResult {
        debug!("Acquiring mongo connection");
        self.database = Some(self.options.mongo.database().await?);
        Ok(())
    }

    #[instrument(skip(self, scheduler))]
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError> {
        let database = self
            .database
            .clone()
            .ok_or("document store has not been connected")?;

        let group =
            ConsumerGroupDescriptor::new(ConsumerGroupIdentifier::RemoveUser, QueueLocation::Head);

        let user_removal = ServiceRunner::<UserRemovalService<MongoChatDatabase>>::new(
            self.options.redis.url.clone(),
            group,
            self.options.queueing.id.clone(),
            database,
        )
        .with_options(self.options.consumer.consumption());

        debug!("Scheduling jobs");
        schedule!(scheduler, { user_removal });

        Ok(Some(Heart::new()))
    }
}
