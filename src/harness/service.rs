use super::RedisCommunicationFactory;
use crate::library::communication::event::{
    ConsumerExt, ConsumerGroupDescriptor, ConsumerIdentifier, ConsumptionOptions,
};
use crate::library::communication::CommunicationFactory;
use crate::library::EmptyResult;
use async_trait::async_trait;
use jatsl::{Job, JobManager};
use std::sync::Arc;

/// Stream consumer which is built from a [`CommunicationFactory`] and some shared configuration
pub trait Service<F: CommunicationFactory + Send + Sync>: Sized {
    /// Name of the service displayed in log messages and job names
    const NAME: &'static str;
    /// Data shared by every instance, like document store handles
    type Config: Send + Sync;

    /// Builds an instance for a single job execution
    fn instantiate(factory: F, config: &Self::Config) -> Self;
}

/// [`Job`] that consumes the stream of a [`Service`] within a consumer group
///
/// Each execution opens its own redis connections and consumes until the job is terminated.
/// Connection loss reported by the connections restarts the job, which then resumes with the
/// entries left pending by the previous execution.
pub struct ServiceRunner<S: Service<RedisCommunicationFactory>> {
    redis_url: String,
    group: ConsumerGroupDescriptor,
    consumer: ConsumerIdentifier,
    config: S::Config,
    options: ConsumptionOptions,
}

impl<S> ServiceRunner<S>
where
    S: Service<RedisCommunicationFactory> + ConsumerExt + Send + Sync,
{
    /// Runner that joins `group` as `consumer` on the given redis server
    pub fn new(
        redis_url: String,
        group: ConsumerGroupDescriptor,
        consumer: ConsumerIdentifier,
        config: S::Config,
    ) -> Self {
        Self {
            redis_url,
            group,
            consumer,
            config,
            options: ConsumptionOptions::default(),
        }
    }

    /// Overrides the default batch size, read timeout and retry interval
    pub fn with_options(mut self, options: ConsumptionOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl<S> Job for ServiceRunner<S>
where
    S: Service<RedisCommunicationFactory> + ConsumerExt + Send + Sync,
{
    const NAME: &'static str = "ServiceRunner";
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    fn name(&self) -> String {
        format!("{}({}@{})", Self::NAME, S::NAME, self.group.identifier())
    }

    async fn execute(&self, manager: JobManager) -> EmptyResult {
        let factory = RedisCommunicationFactory::new(self.redis_url.clone(), Arc::new(manager.clone()));
        let store = factory.queue_store();
        let service = S::instantiate(factory, &self.config);

        manager.ready().await;

        service
            .consume_queue(
                &store,
                &self.group,
                &self.consumer,
                &self.options,
                manager.termination_signal(),
            )
            .await
    }
}
