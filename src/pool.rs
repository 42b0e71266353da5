//! Fixed-size connection pool.
//!
//! All `max_connections` clients are opened up front and parked in
//! [`Slots`]. Checkout waits on a `may` semaphore, which parks the calling
//! coroutine rather than its worker thread, so connection holders keep
//! running while others queue. The returned guard puts the client back when
//! dropped.

use crate::config::DatabaseConfig;
use crate::connection::{self, ConnectionError};
use may::sync::Semphore;
use may_postgres::Client;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

#[derive(Debug)]
pub enum PoolError {
    Connection(ConnectionError),
    /// No connection became free within the configured wait
    Timeout(Duration),
    InvalidConfig(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Connection(e) => write!(f, "Pool connection error: {e}"),
            PoolError::Timeout(waited) => {
                write!(f, "No pooled connection available after {waited:?}")
            }
            PoolError::InvalidConfig(s) => write!(f, "Invalid pool configuration: {s}"),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<ConnectionError> for PoolError {
    fn from(err: ConnectionError) -> Self {
        PoolError::Connection(err)
    }
}

/// Fixed set of idle items guarded by a counting semaphore
///
/// One permit per idle item: `take` consumes a permit before popping, `put`
/// pushes before posting, so a permit always finds an item.
pub(crate) struct Slots<T> {
    permits: Semphore,
    idle: Mutex<Vec<T>>,
}

impl<T> Slots<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self {
            permits: Semphore::new(items.len()),
            idle: Mutex::new(items),
        }
    }

    /// Wait up to `timeout` for an idle item
    pub(crate) fn take(&self, timeout: Duration) -> Option<T> {
        if !self.permits.wait_timeout(timeout) {
            return None;
        }
        let item = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        if item.is_none() {
            // Only reachable if the mutex was poisoned; hand the permit back.
            self.permits.post();
        }
        item
    }

    pub(crate) fn put(&self, item: T) {
        match self.idle.lock() {
            Ok(mut idle) => idle.push(item),
            Err(_) => {
                log::error!("connection pool state poisoned, dropping client");
                return;
            }
        }
        self.permits.post();
    }

    pub(crate) fn idle(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }
}

struct PoolInner {
    url: String,
    slots: Slots<Client>,
    size: usize,
    timeout: Duration,
    test_on_acquire: bool,
}

/// Shared handle to the pool; cloning is cheap
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Open `max_connections` clients against `database.url`
    pub fn from_config(database: &DatabaseConfig) -> Result<Self, PoolError> {
        if database.max_connections == 0 {
            return Err(PoolError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        connection::validate_connection_string(&database.url)?;

        let clients = (0..database.max_connections)
            .map(|_| connection::connect(&database.url))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "connection pool ready with {} connections",
            database.max_connections
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                url: database.url.clone(),
                slots: Slots::new(clients),
                size: database.max_connections,
                timeout: database.pool_timeout(),
                test_on_acquire: database.test_on_acquire,
            }),
        })
    }

    /// Check out a connection, waiting up to the configured timeout
    pub fn acquire(&self) -> Result<PooledConnection, PoolError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::acquire_connection_span().entered();

        let start = Instant::now();
        let client = self
            .inner
            .slots
            .take(self.inner.timeout)
            .ok_or(PoolError::Timeout(self.inner.timeout))?;

        let waited = start.elapsed();
        #[cfg(feature = "metrics")]
        METRICS.record_pool_wait(waited);
        log::debug!("acquired pooled connection after {waited:?}");

        let client = if self.inner.test_on_acquire {
            self.revive(client)?
        } else {
            client
        };

        Ok(PooledConnection {
            client: Some(client),
            pool: self.clone(),
        })
    }

    /// Swap a dead client for a fresh one
    fn revive(&self, client: Client) -> Result<Client, PoolError> {
        if matches!(connection::check_connection_health(&client), Ok(true)) {
            return Ok(client);
        }
        log::warn!("pooled connection failed health check, reconnecting");
        match connection::connect(&self.inner.url) {
            Ok(fresh) => Ok(fresh),
            Err(e) => {
                // Keep the slot occupied so the pool does not shrink.
                self.release(client);
                Err(e.into())
            }
        }
    }

    fn release(&self, client: Client) {
        self.inner.slots.put(client);
    }

    pub fn size(&self) -> usize {
        self.inner.size
    }

    /// Connections currently parked
    pub fn idle(&self) -> usize {
        self.inner.slots.idle()
    }
}

/// A checked-out client, returned to the pool on drop
pub struct PooledConnection {
    client: Option<Client>,
    pool: ConnectionPool,
}

impl Deref for PooledConnection {
    type Target = Client;

    fn deref(&self) -> &Client {
        match &self.client {
            Some(client) => client,
            None => unreachable!("client is only taken in drop"),
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.release(client);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_connections_rejected() {
        let cfg = DatabaseConfig {
            max_connections: 0,
            ..DatabaseConfig::default()
        };
        match ConnectionPool::from_config(&cfg) {
            Err(PoolError::InvalidConfig(msg)) => assert!(msg.contains("max_connections")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("pool should not build"),
        }
    }

    #[test]
    fn test_bad_url_rejected_before_connecting() {
        let cfg = DatabaseConfig {
            url: "not a url".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(matches!(
            ConnectionPool::from_config(&cfg),
            Err(PoolError::Connection(ConnectionError::InvalidConnectionString(_)))
        ));
    }

    #[test]
    fn test_slots_time_out_when_empty() {
        let slots = Slots::new(vec![1]);
        let held = slots.take(Duration::from_millis(10));
        assert_eq!(held, Some(1));
        assert_eq!(slots.take(Duration::from_millis(20)), None);
        slots.put(1);
        assert_eq!(slots.idle(), 1);
        assert_eq!(slots.take(Duration::from_millis(10)), Some(1));
    }

    #[test]
    fn test_waiters_outnumbering_workers_all_get_a_slot() {
        may::config().set_workers(2);
        let slots = Arc::new(Slots::new(vec![0u32, 1]));

        // Far more waiting coroutines than worker threads. Holders must keep
        // being scheduled while the rest wait, or everyone times out.
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let slots = Arc::clone(&slots);
                may::go!(move || {
                    let item = slots.take(Duration::from_secs(5));
                    if let Some(item) = item {
                        may::coroutine::sleep(Duration::from_millis(5));
                        slots.put(item);
                    }
                    item.is_some()
                })
            })
            .collect();

        let served = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(served, 32);
        assert_eq!(slots.idle(), 2);
    }

    #[test]
    fn test_timeout_display() {
        let err = PoolError::Timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }
}
