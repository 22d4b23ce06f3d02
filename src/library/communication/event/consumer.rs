use super::{
    init_group, ConsumerGroupDescriptor, Notification, QueueEntry, QueueError, QueueStore,
    RawQueueEntry, ReadCursor, ReadOptions,
};
use crate::library::EmptyResult;
use async_trait::async_trait;
use futures::{pin_mut, select, Future, FutureExt};
use std::any::type_name;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info_span, instrument, trace, warn, Instrument};

const DEFAULT_BATCH_SIZE: usize = 1;
const DEFAULT_BLOCK_DURATION: Duration = Duration::from_secs(5);
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Tuning parameters for the consumption loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionOptions {
    /// Maximum number of entries read per iteration
    pub batch_size: usize,
    /// Maximum time a read waits for new entries
    pub block: Duration,
    /// Pause after a failed read before trying again
    pub retry_interval: Duration,
}

impl Default for ConsumptionOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            block: DEFAULT_BLOCK_DURATION,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl ConsumptionOptions {
    fn read_options(&self) -> ReadOptions {
        ReadOptions {
            block: self.block,
            count: self.batch_size,
        }
    }
}

/// Result of a single read-and-process iteration
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Number of entries handed out by the store
    pub received: usize,
    /// Number of entries which have been processed and acknowledged
    pub acknowledged: usize,
}

/// Entity which may consume and process [`Notifications`](Notification)
#[async_trait]
pub trait Consumer {
    /// Notification to consume
    type Notification: Notification;

    /// Processes an event notification and returns whether it succeeded or failed
    async fn consume(&self, notification: Self::Notification) -> EmptyResult;
}

/// Helper functions to aid the consumption of messages
#[async_trait]
pub trait ConsumerExt {
    /// Consumes notifications from a queue using the given store and acknowledges
    /// those that have been successfully processed.
    ///
    /// Entries which have been delivered to this consumer previously but never acknowledged
    /// are processed first. Afterwards, new entries are read until the `shutdown` future resolves.
    /// Store failures are logged and retried indefinitely.
    async fn consume_queue<S, T>(
        &self,
        store: &S,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        options: &ConsumptionOptions,
        shutdown: T,
    ) -> EmptyResult
    where
        S: QueueStore + Send + Sync,
        T: Future<Output = ()> + Send;

    /// Reads one batch from the given cursor, processes it and advances the cursor
    ///
    /// A pending cursor moves past the last returned entry and switches over to new
    /// entries once the pending list has been drained.
    async fn poll_queue<S>(
        &self,
        store: &S,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        options: &ConsumptionOptions,
        cursor: &mut ReadCursor,
    ) -> Result<PollOutcome, QueueError>
    where
        S: QueueStore + Send + Sync;
}

#[async_trait]
impl<C> ConsumerExt for C
where
    C: Consumer + Send + Sync,
    C::Notification: Send + Sync,
{
    #[instrument(skip(self, store, group, options, shutdown), fields(notification = type_name::<C::Notification>(), group = %group.identifier()))]
    async fn consume_queue<S, T>(
        &self,
        store: &S,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        options: &ConsumptionOptions,
        shutdown: T,
    ) -> EmptyResult
    where
        S: QueueStore + Send + Sync,
        T: Future<Output = ()> + Send,
    {
        let queue = C::Notification::queue();
        let shutdown = shutdown.fuse();
        pin_mut!(shutdown);

        let mut cursor = ReadCursor::pending();
        let mut group_ready = false;

        loop {
            let result = if group_ready {
                let poll = self
                    .poll_queue(store, group, consumer, options, &mut cursor)
                    .fuse();
                pin_mut!(poll);

                select! {
                    result = poll => result.map(|outcome| {
                        if outcome.received == 0 {
                            trace!("No new entries within block duration");
                        }
                    }),
                    () = shutdown => break,
                }
            } else {
                init_group(store, &queue, group)
                    .await
                    .map(|_| group_ready = true)
            };

            if let Err(error) = result {
                error!(queue = queue.key(), %error, "Failed to read from queue");

                // Group and its pending list vanished with the queue, start from scratch
                if let QueueError::NoGroup { .. } = error {
                    group_ready = false;
                    cursor = ReadCursor::pending();
                }

                let pause = sleep(options.retry_interval).fuse();
                pin_mut!(pause);

                select! {
                    () = pause => {},
                    () = shutdown => break,
                }
            }
        }

        debug!("Consumption loop terminated");
        Ok(())
    }

    async fn poll_queue<S>(
        &self,
        store: &S,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        options: &ConsumptionOptions,
        cursor: &mut ReadCursor,
    ) -> Result<PollOutcome, QueueError>
    where
        S: QueueStore + Send + Sync,
    {
        let queue = C::Notification::queue();
        let entries = store
            .read_group(&queue, group, consumer, cursor, &options.read_options())
            .await?;

        let mut outcome = PollOutcome {
            received: entries.len(),
            acknowledged: 0,
        };

        if let ReadCursor::Pending(_) = cursor {
            *cursor = match entries.last() {
                Some(entry) => ReadCursor::Pending(entry.id().to_owned()),
                None => {
                    debug!("Pending entries drained, switching to new entries");
                    ReadCursor::New
                }
            };
        }

        for entry in entries {
            let span = info_span!("entry", id = entry.id());

            let acknowledged = async {
                let notification = match entry.parse_payload::<C::Notification>(C::Notification::TAG) {
                    Ok(notification) => notification,
                    Err(error) => {
                        warn!(fields = ?entry.fields(), %error, "Failed to deserialize {}", type_name::<C::Notification>());
                        return false;
                    }
                };

                if let Err(error) = self.consume(notification).await {
                    warn!(fields = ?entry.fields(), %error, "Failed to consume {}", type_name::<C::Notification>());
                    return false;
                }

                match store.ack(&queue, group, entry.id()).await {
                    Ok(()) => true,
                    Err(error) => {
                        warn!(%error, "Failed to acknowledge {}", type_name::<C::Notification>());
                        false
                    }
                }
            }
            .instrument(span)
            .await;

            if acknowledged {
                outcome.acknowledged += 1;
            }
        }

        Ok(outcome)
    }
}
