use super::resource::{RedisResource, SharedConnection};
use crate::library::communication::implementation::redis::{
    RedisConnection, RedisConnectionVariant, RedisFactory, RedisQueueStore,
};
use crate::library::communication::implementation::StreamPublisher;
use crate::library::communication::CommunicationFactory;
use crate::library::BoxedError;
use async_trait::async_trait;
use jatsl::{JobManager, TaskResourceHandle};
use std::sync::Arc;

/// Factory to provide [`TaskResourceHandle`] instances
pub trait ResourceHandleProvider {
    /// Instantiates a new [`TaskResourceHandle`]
    fn create_handle(&self) -> TaskResourceHandle;
}

impl ResourceHandleProvider for JobManager {
    fn create_handle(&self) -> TaskResourceHandle {
        self.create_resource_handle()
    }
}

/// Dynamic dispatch version of [`ResourceHandleProvider`]
pub type BoxedResourceHandleProvider = Arc<dyn ResourceHandleProvider + Send + Sync>;

/// [`RedisFactory`] implementation providing [`jatsl`] interop
pub struct MonitoredRedisFactory {
    url: String,
    handle_provider: BoxedResourceHandleProvider,
    shared: SharedConnection,
}

impl MonitoredRedisFactory {
    /// Creates a new factory opening connections to the given URL
    pub fn new(url: String, handle_provider: BoxedResourceHandleProvider) -> Self {
        Self {
            url,
            handle_provider,
            shared: SharedConnection::default(),
        }
    }
}

#[async_trait]
impl RedisFactory for MonitoredRedisFactory {
    type Connection = RedisResource<RedisConnection>;

    async fn connection(
        &self,
        variant: RedisConnectionVariant,
    ) -> Result<Self::Connection, BoxedError> {
        let handle = self.handle_provider.create_handle();

        let resource = match variant {
            RedisConnectionVariant::Owned => RedisResource::owned(handle, &self.url).await?,
            RedisConnectionVariant::Multiplexed => {
                RedisResource::shared(handle, &self.url, self.shared.clone()).await?
            }
        };

        Ok(resource)
    }
}

/// Communication factory based on [`MonitoredRedisFactory`]
///
/// The queue store and the publisher handed out by one factory share their connections.
pub struct RedisCommunicationFactory {
    store: Arc<RedisQueueStore<MonitoredRedisFactory>>,
}

impl RedisCommunicationFactory {
    /// Creates a new instance which connects to the given URL and reports status using the given handle factory
    pub fn new(url: String, handle_provider: BoxedResourceHandleProvider) -> Self {
        let factory = MonitoredRedisFactory::new(url, handle_provider);

        Self {
            store: Arc::new(RedisQueueStore::new(factory)),
        }
    }
}

impl CommunicationFactory for RedisCommunicationFactory {
    type QueueStore = Arc<RedisQueueStore<MonitoredRedisFactory>>;
    type NotificationPublisher = StreamPublisher<RedisQueueStore<MonitoredRedisFactory>>;

    fn queue_store(&self) -> Self::QueueStore {
        self.store.clone()
    }

    fn notification_publisher(&self) -> Self::NotificationPublisher {
        StreamPublisher::new(self.store.clone())
    }
}
