use crate::library::BoxedError;
use async_trait::async_trait;
use redis::aio::{Connection, ConnectionLike, MultiplexedConnection};
use redis::{Cmd, Pipeline, RedisFuture, Value};

/// Variant for redis connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedisConnectionVariant {
    /// Individual connection that may allow for blocking commands without disturbing other users.
    /// This variant indicates that the consumer is operating long-running, blocking operations on the connection.
    Owned,
    /// Connection that can be shared between multiple users and generally does not permit blocking commands
    Multiplexed,
}

/// Either of the connection types provided by the [`redis`] crate
pub enum RedisConnection {
    /// Dedicated connection
    Owned(Connection),
    /// Handle to a connection shared with other users
    Multiplexed(MultiplexedConnection),
}

impl ConnectionLike for RedisConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            Self::Owned(con) => con.req_packed_command(cmd),
            Self::Multiplexed(con) => con.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            Self::Owned(con) => con.req_packed_commands(cmd, offset, count),
            Self::Multiplexed(con) => con.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            Self::Owned(con) => con.get_db(),
            Self::Multiplexed(con) => con.get_db(),
        }
    }
}

/// Factory for redis connections of different [types](RedisConnectionVariant)
#[async_trait]
pub trait RedisFactory {
    /// Connection type handed out by the factory
    type Connection: ConnectionLike + Send;

    /// Establishes a new connection or clones a shared one
    async fn connection(
        &self,
        variant: RedisConnectionVariant,
    ) -> Result<Self::Connection, BoxedError>;
}
