use super::{RedisConnectionVariant, RedisFactory};
use super::{ERROR_CODE_GROUP_EXISTS, ERROR_CODE_NO_GROUP};
use super::{STREAM_ID_ADDITIONS, STREAM_ID_HEAD, STREAM_ID_NEW, STREAM_ID_TAIL};
use crate::library::communication::event::{
    ConsumerGroupDescriptor, EntryId, QueueDescriptor, QueueError, QueueLocation, QueueStore,
    ReadCursor, ReadOptions, StreamEntry,
};
use async_trait::async_trait;
use futures::lock::Mutex;
use redis::streams::{StreamMaxlen, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, RedisError};
use std::time::Duration;
use tracing::{debug, trace};

/// [`QueueStore`] implementation backed by redis streams
///
/// - Append using [`XADD`](https://redis.io/commands/xadd) with approximate `MAXLEN` trimming
/// - Group creation using [`XGROUP CREATE … MKSTREAM`](https://redis.io/commands/xgroup-create)
/// - Reads using [`XREADGROUP`](https://redis.io/commands/xreadgroup) on a dedicated connection
/// - Acknowledgement using [`XACK`](https://redis.io/commands/xack)
///
/// Non-blocking commands obtain a multiplexed connection from the factory for every call so that
/// concurrent appends are pipelined instead of queueing up behind each other. Factories are expected
/// to hand out handles to one shared connection for that variant. The dedicated read connection is
/// acquired lazily and discarded after a failure so that the next read reconnects.
pub struct RedisQueueStore<F: RedisFactory> {
    factory: F,
    blocking: Mutex<Option<F::Connection>>,
}

impl<F> RedisQueueStore<F>
where
    F: RedisFactory + Send + Sync,
{
    /// Creates a new instance which obtains connections from the given factory
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            blocking: Mutex::new(None),
        }
    }

    async fn multiplexed(&self) -> Result<F::Connection, QueueError> {
        self.factory
            .connection(RedisConnectionVariant::Multiplexed)
            .await
            .map_err(QueueError::Transport)
    }

    async fn take_connection(
        &self,
        slot: &mut Option<F::Connection>,
        variant: RedisConnectionVariant,
    ) -> Result<F::Connection, QueueError> {
        match slot.take() {
            Some(con) => Ok(con),
            None => {
                trace!(?variant, "Acquiring redis connection");
                self.factory
                    .connection(variant)
                    .await
                    .map_err(QueueError::Transport)
            }
        }
    }
}

/// Returns a connection to its slot unless the command failed on the transport level
fn release<C, T>(slot: &mut Option<C>, con: C, result: &Result<T, QueueError>) {
    if let Err(QueueError::Transport(_)) = result {
        debug!("Discarding redis connection after transport failure");
    } else {
        *slot = Some(con);
    }
}

/// Redis treats a zero timeout as an indefinite wait, reads are therefore bounded by at least one millisecond
fn block_millis(block: Duration) -> usize {
    block.as_millis().max(1) as usize
}

/// Translates a redis error into the matching queue error class
fn classify(
    error: RedisError,
    queue: &QueueDescriptor,
    group: Option<&ConsumerGroupDescriptor>,
) -> QueueError {
    match (error.code(), group) {
        (Some(ERROR_CODE_GROUP_EXISTS), _) => QueueError::GroupExists,
        (Some(ERROR_CODE_NO_GROUP), Some(group)) => QueueError::NoGroup {
            queue: queue.key().to_owned(),
            group: group.identifier().to_string(),
        },
        _ => QueueError::transport(error),
    }
}

/// Flattens a stream read reply into a list of entries
fn entries_from_reply(reply: StreamReadReply) -> Result<Vec<StreamEntry>, QueueError> {
    let mut entries = Vec::new();

    for key in reply.keys {
        for stream_id in key.ids {
            let mut fields = stream_id
                .map
                .into_iter()
                .map(|(field, value)| {
                    redis::from_redis_value::<String>(&value).map(|value| (field, value))
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(QueueError::transport)?;

            // Field order is not retained by the reply so we fall back to a stable one
            fields.sort();

            entries.push(StreamEntry::new(stream_id.id, fields));
        }
    }

    Ok(entries)
}

#[async_trait]
impl<F> QueueStore for RedisQueueStore<F>
where
    F: RedisFactory + Send + Sync,
{
    async fn append(
        &self,
        queue: &QueueDescriptor,
        fields: &[(String, String)],
    ) -> Result<EntryId, QueueError> {
        let mut con = self.multiplexed().await?;
        con.xadd_maxlen::<_, _, _, _, String>(
            queue.key(),
            StreamMaxlen::Approx(queue.limit()),
            STREAM_ID_NEW,
            fields,
        )
        .await
        .map_err(|e| classify(e, queue, None))
    }

    async fn create_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<(), QueueError> {
        let start = match group.start() {
            QueueLocation::Head => STREAM_ID_HEAD,
            QueueLocation::Tail => STREAM_ID_TAIL,
        };

        let mut con = self.multiplexed().await?;
        con.xgroup_create_mkstream::<_, _, _, ()>(queue.key(), group.identifier().to_string(), start)
            .await
            .map_err(|e| classify(e, queue, Some(group)))
    }

    async fn read_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        cursor: &ReadCursor,
        options: &ReadOptions,
    ) -> Result<Vec<StreamEntry>, QueueError> {
        let id = match cursor {
            ReadCursor::Pending(id) => id.as_str(),
            ReadCursor::New => STREAM_ID_ADDITIONS,
        };

        let read_options = StreamReadOptions::default()
            .group(group.identifier().to_string(), consumer)
            .count(options.count)
            .block(block_millis(options.block));

        let mut slot = self.blocking.lock().await;
        let mut con = self
            .take_connection(&mut *slot, RedisConnectionVariant::Owned)
            .await?;

        let result = con
            .xread_options::<_, _, Option<StreamReadReply>>(&[queue.key()], &[id], &read_options)
            .await
            .map_err(|e| classify(e, queue, Some(group)));

        release(&mut *slot, con, &result);

        match result? {
            Some(reply) => entries_from_reply(reply),
            None => Ok(Vec::new()),
        }
    }

    async fn ack(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: &str,
    ) -> Result<(), QueueError> {
        let mut con = self.multiplexed().await?;
        con.xack::<_, _, _, ()>(queue.key(), group.identifier().to_string(), &[id])
            .await
            .map_err(|e| classify(e, queue, Some(group)))
    }
}
