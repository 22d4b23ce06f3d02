use crate::library::communication::implementation::redis::RedisConnection;
use futures::lock::Mutex;
use futures::FutureExt;
use jatsl::TaskResourceHandle;
use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::{Client, Cmd, Pipeline, RedisError, RedisFuture, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::yield_now;
use tokio::time::{sleep, timeout};
use tracing::{error, instrument, trace, warn};

const RETRY_INTERVAL: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// Multiplexed connection shared by all users of one factory
pub(super) type SharedConnection = Arc<Mutex<Option<MultiplexedConnection>>>;

/// Redis connection that reports connection loss to the owning job
///
/// When the transport fails, the [`TaskResourceHandle`] is notified which causes the job to be
/// restarted by the scheduler. Shared connections are invalidated so the next user reconnects.
pub struct RedisResource<C: ConnectionLike> {
    con: C,
    handle: TaskResourceHandle,
    shared: Option<SharedConnection>,
}

impl RedisResource<RedisConnection> {
    /// Opens a dedicated connection, retrying until the server is reachable
    #[instrument(skip(handle))]
    pub(super) async fn owned(handle: TaskResourceHandle, url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let con = connect(|| client.get_async_connection()).await;

        Ok(Self {
            con: RedisConnection::Owned(con),
            handle,
            shared: None,
        })
    }

    /// Clones the shared connection or establishes it if there is none
    #[instrument(skip(handle, shared))]
    pub(super) async fn shared(
        handle: TaskResourceHandle,
        url: &str,
        shared: SharedConnection,
    ) -> Result<Self, RedisError> {
        let mut slot = shared.lock().await;

        let con = match &*slot {
            Some(con) => {
                trace!("Reusing existing shared connection");
                con.clone()
            }
            None => {
                trace!("Creating new shared connection");
                let client = Client::open(url)?;
                let con = connect(|| client.get_multiplexed_tokio_connection()).await;
                *slot = Some(con.clone());
                con
            }
        };

        drop(slot);

        Ok(Self {
            con: RedisConnection::Multiplexed(con),
            handle,
            shared: Some(shared),
        })
    }
}

async fn connect<F, Fut, C>(open: F) -> C
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<C, RedisError>>,
{
    let mut attempt = 0;

    loop {
        trace!(attempt, "Connecting to redis");

        match timeout(CONNECT_TIMEOUT, open()).await {
            Ok(Ok(con)) => return con,
            Ok(Err(error)) => warn!(?error, "Failed to connect to redis"),
            Err(error) => warn!(?error, "Timeout connecting to redis"),
        }

        sleep(RETRY_INTERVAL).await;
        attempt += 1;
    }
}

impl<C: ConnectionLike> RedisResource<C> {
    async fn notify(&mut self, error: &RedisError) {
        error!(?error, "Redis connection encountered error");

        self.handle.resource_died().await;

        if let Some(shared) = &self.shared {
            trace!("Invalidating shared connection");
            *shared.lock().await = None;
        }

        yield_now().await;
    }
}

fn is_disconnect(error: &RedisError) -> bool {
    error.is_connection_dropped()
        || error.is_io_error()
        || error.is_connection_refusal()
        || error.is_timeout()
}

impl<C: ConnectionLike + Send> ConnectionLike for RedisResource<C> {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        (async move {
            let result = self.con.req_packed_command(cmd).await;

            if let Err(ref error) = result {
                if is_disconnect(error) {
                    self.notify(error).await;
                }
            }

            result
        })
        .boxed()
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        (async move {
            let result = self.con.req_packed_commands(cmd, offset, count).await;

            if let Err(ref error) = result {
                if is_disconnect(error) {
                    self.notify(error).await;
                }
            }

            result
        })
        .boxed()
    }

    fn get_db(&self) -> i64 {
        self.con.get_db()
    }
}
