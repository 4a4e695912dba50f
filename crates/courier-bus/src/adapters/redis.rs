//! # Redis Transport
//!
//! [`QueueTransport`] over Redis lists, through owned `deadpool-redis`
//! connection pools.
//!
//! - push: `MULTI; RPUSH key value; EXPIRE key ttl; EXEC`
//! - pop: `BLPOP key timeout`
//!
//! Blocking pops check out from their own pool. A connection parked in
//! `BLPOP` therefore never starves the pushes that would wake it, however
//! many dispatchers and waiters are blocked at once.

use std::time::Duration;

use async_trait::async_trait;
use courier_types::MAX_TTL_SECS;
use deadpool_redis::redis::{self, RedisError};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, PoolError, Runtime};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::ports::QueueTransport;

/// Default number of connections in each pool.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// How long a push or ping waits for a free connection before failing with
/// [`TransportError::Pool`].
pub const COMMAND_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed queue store.
pub struct RedisTransport {
    /// Short commands: push and ping.
    commands: Pool,
    /// `BLPOP` only.
    blocking: Pool,
    closed: watch::Sender<bool>,
}

impl RedisTransport {
    /// Build both pools for `url` and verify the server answers `PING`.
    ///
    /// `pool_size` applies to each pool.
    pub async fn connect(url: &str, pool_size: usize) -> Result<Self, TransportError> {
        let commands = create_pool(url, pool_config(pool_size, Some(COMMAND_CHECKOUT_TIMEOUT)))?;
        let blocking = create_pool(url, pool_config(pool_size, None))?;

        let transport = Self::from_pools(commands, blocking);
        transport.ping().await?;

        info!(pool_size, "connected to redis");
        Ok(transport)
    }

    /// Wrap existing pools. No connectivity check is made.
    ///
    /// `commands` serves pushes and pings, `blocking` serves `BLPOP`. Giving
    /// both roles the same pool lets blocked pops starve pushes.
    pub fn from_pools(commands: Pool, blocking: Pool) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            commands,
            blocking,
            closed,
        }
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if *self.closed.borrow() {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    async fn command_connection(&self) -> Result<Connection, TransportError> {
        self.ensure_open()?;
        self.commands.get().await.map_err(map_pool_error)
    }

    /// A blocking connection, or `None` if none freed up within
    /// `timeout_secs` (`0` waits as long as it takes).
    async fn blocking_connection(&self, timeout_secs: u64) -> Result<Option<Connection>, TransportError> {
        self.ensure_open()?;
        let checkout = self.blocking.get();
        if timeout_secs == 0 {
            return checkout.await.map(Some).map_err(map_pool_error);
        }
        match tokio::time::timeout(Duration::from_secs(timeout_secs), checkout).await {
            Ok(conn) => conn.map(Some).map_err(map_pool_error),
            Err(_) => Ok(None),
        }
    }
}

fn pool_config(pool_size: usize, wait: Option<Duration>) -> PoolConfig {
    let mut config = PoolConfig::new(pool_size.max(1));
    config.timeouts.wait = wait;
    config
}

fn create_pool(url: &str, pool: PoolConfig) -> Result<Pool, TransportError> {
    let mut config = Config::from_url(url);
    config.pool = Some(pool);
    config
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| TransportError::Pool(e.to_string()))
}

/// `EXPIRE` argument for `ttl_secs`. Redis rejects out-of-range values only
/// at `EXEC`, after `RPUSH` has already been applied, so they never reach it.
fn expire_arg(ttl_secs: u64) -> Result<i64, TransportError> {
    Some(ttl_secs)
        .filter(|secs| *secs <= MAX_TTL_SECS)
        .and_then(|secs| i64::try_from(secs).ok())
        .ok_or_else(|| TransportError::Protocol(format!("invalid expire time {ttl_secs}")))
}

/// `BLPOP` timeout left after spending `elapsed` on checkout. Never turns a
/// finite wait into `0`, which would block forever.
fn remaining_block_secs(timeout_secs: u64, elapsed: Duration) -> u64 {
    if timeout_secs == 0 {
        return 0;
    }
    timeout_secs.saturating_sub(elapsed.as_secs()).max(1)
}

#[async_trait]
impl QueueTransport for RedisTransport {
    async fn push_with_expiry(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> Result<(), TransportError> {
        let ttl = expire_arg(ttl_secs)?;
        let mut conn = self.command_connection().await?;

        redis::pipe()
            .atomic()
            .rpush(key, value)
            .ignore()
            .expire(key, ttl)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_error)
    }

    async fn blocking_pop(
        &self,
        key: &str,
        timeout_secs: u64,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let started = Instant::now();
        let Some(mut conn) = self.blocking_connection(timeout_secs).await? else {
            return Ok(None);
        };
        let mut closed = self.closed.subscribe();

        let mut cmd = redis::cmd("BLPOP");
        cmd.arg(key).arg(remaining_block_secs(timeout_secs, started.elapsed()));

        tokio::select! {
            popped = cmd.query_async::<Option<(String, Vec<u8>)>>(&mut conn) => {
                popped
                    .map(|item| item.map(|(_, value)| value))
                    .map_err(map_redis_error)
            }
            _ = async { let _ = closed.wait_for(|closed| *closed).await; } => {
                Err(TransportError::Closed)
            }
        }
    }

    async fn ping(&self) -> Result<(), TransportError> {
        let mut conn = self.command_connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_redis_error)
    }

    async fn close(&self) {
        self.closed.send_replace(true);
        self.commands.close();
        self.blocking.close();
        debug!("redis transport closed");
    }
}

fn map_redis_error(err: RedisError) -> TransportError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        TransportError::Connection(err.to_string())
    } else {
        TransportError::Protocol(err.to_string())
    }
}

fn map_pool_error(err: PoolError) -> TransportError {
    match err {
        PoolError::Backend(err) => map_redis_error(err),
        PoolError::Closed => TransportError::Closed,
        other => TransportError::Pool(other.to_string()),
    }
}
