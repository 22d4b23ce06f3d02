use crate::library::communication::event::{
    ConsumerGroupDescriptor, EntryId, QueueDescriptor, QueueError, QueueLocation, QueueStore,
    RawQueueEntry, ReadCursor, ReadOptions, StreamEntry,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;

#[derive(Default)]
struct MockGroup {
    last_delivered: u64,
    /// Delivered but unacknowledged entries and the consumer they were delivered to
    pending: BTreeMap<u64, String>,
}

#[derive(Default)]
struct MockStream {
    sequence: u64,
    entries: BTreeMap<u64, Vec<(String, String)>>,
    groups: HashMap<String, MockGroup>,
}

/// In-memory [`QueueStore`] mimicking redis stream semantics
#[derive(Default)]
pub struct MockQueueStore {
    streams: Mutex<HashMap<String, MockStream>>,
    appended: Notify,
    offline: AtomicBool,
}

fn format_id(sequence: u64) -> EntryId {
    format!("{}-0", sequence)
}

fn parse_id(id: &str) -> u64 {
    id.split('-')
        .next()
        .and_then(|sequence| sequence.parse().ok())
        .unwrap_or_default()
}

impl MockQueueStore {
    /// Makes every subsequent call fail with a transport error until reverted
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Entries currently retained in the queue
    pub fn entries(&self, queue: &QueueDescriptor) -> Vec<StreamEntry> {
        self.streams
            .lock()
            .unwrap()
            .get(queue.key())
            .map(|stream| {
                stream
                    .entries
                    .iter()
                    .map(|(sequence, fields)| StreamEntry::new(format_id(*sequence), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deserialized payloads of all retained entries tagged with `tag`
    pub fn payloads<T: serde::de::DeserializeOwned>(
        &self,
        queue: &QueueDescriptor,
        tag: &str,
    ) -> Vec<T> {
        self.entries(queue)
            .iter()
            .filter_map(|entry| entry.payload(tag))
            .map(|payload| serde_json::from_str(payload).unwrap())
            .collect()
    }

    /// Ids of all entries pending within a group, regardless of consumer
    pub fn pending(&self, queue: &QueueDescriptor, group: &ConsumerGroupDescriptor) -> Vec<EntryId> {
        self.streams
            .lock()
            .unwrap()
            .get(queue.key())
            .and_then(|stream| stream.groups.get(&group.identifier().to_string()))
            .map(|group| group.pending.keys().copied().map(format_id).collect())
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), QueueError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(QueueError::transport("mock queue store is offline"))
        } else {
            Ok(())
        }
    }

    fn try_read(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        cursor: &ReadCursor,
        count: usize,
    ) -> Result<Vec<StreamEntry>, QueueError> {
        let mut streams = self.streams.lock().unwrap();
        let group_name = group.identifier().to_string();
        let no_group = || QueueError::NoGroup {
            queue: queue.key().to_owned(),
            group: group_name.clone(),
        };

        let stream = streams.get_mut(queue.key()).ok_or_else(no_group)?;
        let state = stream.groups.get_mut(&group_name).ok_or_else(no_group)?;

        let entries = match cursor {
            ReadCursor::Pending(after) => {
                let after = parse_id(after);
                state
                    .pending
                    .range(after + 1..)
                    .filter(|(_, owner)| owner.as_str() == consumer)
                    .take(count)
                    .map(|(sequence, _)| {
                        let fields = stream.entries.get(sequence).cloned().unwrap_or_default();
                        StreamEntry::new(format_id(*sequence), fields)
                    })
                    .collect()
            }
            ReadCursor::New => {
                let delivered: Vec<(u64, Vec<(String, String)>)> = stream
                    .entries
                    .range(state.last_delivered + 1..)
                    .take(count)
                    .map(|(sequence, fields)| (*sequence, fields.clone()))
                    .collect();

                for (sequence, _) in delivered.iter() {
                    state.last_delivered = *sequence;
                    state.pending.insert(*sequence, consumer.to_owned());
                }

                delivered
                    .into_iter()
                    .map(|(sequence, fields)| StreamEntry::new(format_id(sequence), fields))
                    .collect()
            }
        };

        Ok(entries)
    }
}

#[async_trait]
impl QueueStore for MockQueueStore {
    async fn append(
        &self,
        queue: &QueueDescriptor,
        fields: &[(String, String)],
    ) -> Result<EntryId, QueueError> {
        self.check_online()?;

        let id = {
            let mut streams = self.streams.lock().unwrap();
            let stream = streams.entry(queue.key().to_owned()).or_default();

            stream.sequence += 1;
            stream.entries.insert(stream.sequence, fields.to_vec());

            while stream.entries.len() > queue.limit() {
                let oldest = *stream.entries.keys().next().unwrap();
                stream.entries.remove(&oldest);
            }

            format_id(stream.sequence)
        };

        self.appended.notify_waiters();

        Ok(id)
    }

    async fn create_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
    ) -> Result<(), QueueError> {
        self.check_online()?;

        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(queue.key().to_owned()).or_default();
        let identifier = group.identifier().to_string();

        if stream.groups.contains_key(&identifier) {
            return Err(QueueError::GroupExists);
        }

        let last_delivered = match group.start() {
            QueueLocation::Head => 0,
            QueueLocation::Tail => stream.sequence,
        };

        stream.groups.insert(
            identifier,
            MockGroup {
                last_delivered,
                pending: BTreeMap::new(),
            },
        );

        Ok(())
    }

    async fn read_group(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        consumer: &str,
        cursor: &ReadCursor,
        options: &ReadOptions,
    ) -> Result<Vec<StreamEntry>, QueueError> {
        self.check_online()?;

        let appended = self.appended.notified();
        let entries = self.try_read(queue, group, consumer, cursor, options.count)?;

        if !entries.is_empty() || *cursor != ReadCursor::New || options.block.is_zero() {
            return Ok(entries);
        }

        match timeout(options.block, appended).await {
            Ok(()) => self.try_read(queue, group, consumer, cursor, options.count),
            Err(_) => Ok(Vec::new()),
        }
    }

    async fn ack(
        &self,
        queue: &QueueDescriptor,
        group: &ConsumerGroupDescriptor,
        id: &str,
    ) -> Result<(), QueueError> {
        self.check_online()?;

        let mut streams = self.streams.lock().unwrap();
        if let Some(state) = streams
            .get_mut(queue.key())
            .and_then(|stream| stream.groups.get_mut(&group.identifier().to_string()))
        {
            state.pending.remove(&parse_id(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::library::communication::event::{init_group, ConsumerGroupIdentifier};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn queue() -> QueueDescriptor {
        QueueDescriptor::new("stream:test".into(), 3)
    }

    fn group(name: &str) -> ConsumerGroupDescriptor {
        ConsumerGroupDescriptor::new(
            ConsumerGroupIdentifier::Other(name.into()),
            QueueLocation::Head,
        )
    }

    fn options() -> ReadOptions {
        ReadOptions {
            block: Duration::from_millis(10),
            count: 10,
        }
    }

    fn fields(value: &str) -> Vec<(String, String)> {
        vec![("data".into(), value.into())]
    }

    #[tokio::test]
    async fn assign_increasing_ids() {
        let store = MockQueueStore::default();
        let first = store.append(&queue(), &fields("a")).await.unwrap();
        let second = store.append(&queue(), &fields("b")).await.unwrap();

        assert!(parse_id(&second) > parse_id(&first));
    }

    #[tokio::test]
    async fn trim_to_queue_limit() {
        let store = MockQueueStore::default();
        for value in ["a", "b", "c", "d"] {
            store.append(&queue(), &fields(value)).await.unwrap();
        }

        let entries = store.entries(&queue());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].payload("data"), Some("b"));
    }

    #[tokio::test]
    async fn report_existing_groups() {
        let store = MockQueueStore::default();
        store.create_group(&queue(), &group("g")).await.unwrap();

        let result = store.create_group(&queue(), &group("g")).await;
        assert!(matches!(result, Err(QueueError::GroupExists)));
        assert!(init_group(&store, &queue(), &group("g")).await.is_ok());
    }

    #[tokio::test]
    async fn deliver_to_groups_independently() {
        let store = MockQueueStore::default();
        init_group(&store, &queue(), &group("one")).await.unwrap();
        init_group(&store, &queue(), &group("two")).await.unwrap();
        store.append(&queue(), &fields("a")).await.unwrap();

        let one = store
            .read_group(&queue(), &group("one"), "c", &ReadCursor::New, &options())
            .await
            .unwrap();
        let two = store
            .read_group(&queue(), &group("two"), "c", &ReadCursor::New, &options())
            .await
            .unwrap();

        assert_eq!(one, two);
        assert_eq!(one.len(), 1);
    }

    #[tokio::test]
    async fn share_entries_between_consumers_of_a_group() {
        let store = MockQueueStore::default();
        init_group(&store, &queue(), &group("g")).await.unwrap();
        store.append(&queue(), &fields("a")).await.unwrap();

        let first = store
            .read_group(&queue(), &group("g"), "x", &ReadCursor::New, &options())
            .await
            .unwrap();
        let second = store
            .read_group(&queue(), &group("g"), "y", &ReadCursor::New, &options())
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn acknowledge_idempotently() {
        let store = MockQueueStore::default();
        init_group(&store, &queue(), &group("g")).await.unwrap();
        let id = store.append(&queue(), &fields("a")).await.unwrap();
        store
            .read_group(&queue(), &group("g"), "x", &ReadCursor::New, &options())
            .await
            .unwrap();

        store.ack(&queue(), &group("g"), &id).await.unwrap();
        store.ack(&queue(), &group("g"), &id).await.unwrap();

        assert!(store.pending(&queue(), &group("g")).is_empty());
    }

    #[tokio::test]
    async fn wake_blocked_readers_on_append() {
        let store = std::sync::Arc::new(MockQueueStore::default());
        init_group(&*store, &queue(), &group("g")).await.unwrap();

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                let options = ReadOptions {
                    block: Duration::from_secs(5),
                    count: 1,
                };
                store
                    .read_group(&queue(), &group("g"), "x", &ReadCursor::New, &options)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.append(&queue(), &fields("a")).await.unwrap();

        let entries = reader.await.unwrap().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn fail_reads_on_unknown_groups() {
        let store = MockQueueStore::default();
        let result = store
            .read_group(&queue(), &group("g"), "x", &ReadCursor::New, &options())
            .await;

        assert!(matches!(result, Err(QueueError::NoGroup { .. })));
    }
}
