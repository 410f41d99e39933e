//! Redis-backed item store.
//!
//! Connections come from a `bb8-redis` pool shared by every request. Each
//! item is a Redis hash under a namespaced key; secondary indexes are sorted
//! sets scored by first insertion so queries return items in insertion order.
//!
//! # Atomicity
//!
//! - `put` runs as one Lua script, so the hash and its index entry change
//!   together.
//! - `update` applies exact decimal arithmetic under optimistic locking
//!   (`WATCH` / `MULTI` / `EXEC`). A concurrent writer aborts the `EXEC` and
//!   the add is recomputed from the fresh value, so no update is lost.
//! - `next_sequence` is a plain `INCR`.
//!
//! The put script derives index keys at runtime, so the adapter targets a
//! single Redis node rather than a cluster.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::redis::{self, RedisError};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::ports::{ItemStore, ItemStoreError};
use crate::domain::{AttributeValue, Item, Table, UpdateExpression};

mod codec;
mod scripts;

use codec::{KeySpace, decode_item, decode_value, encode_item, encode_value};

/// Upper bound on optimistic-lock attempts for a single update.
const MAX_UPDATE_ATTEMPTS: u32 = 32;

/// Configuration for the Redis connection pool.
///
/// # Example
///
/// ```ignore
/// let config = RedisStoreConfig::new("redis://127.0.0.1/")
///     .with_namespace("ledger")
///     .with_max_size(16);
/// ```
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    url: String,
    namespace: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl RedisStoreConfig {
    /// Create a configuration with the given Redis URL.
    ///
    /// Defaults: namespace `ledger`, 10 connections, 5 second checkout timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: "ledger".to_owned(),
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
        }
    }

    /// Prefix every key with `namespace`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Cap the number of pooled connections.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Bound how long a checkout waits for a free connection.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// [`ItemStore`] on a remote Redis server.
#[derive(Clone)]
pub struct RedisItemStore {
    pool: Pool<RedisConnectionManager>,
    keys: KeySpace,
    put_script: redis::Script,
}

fn command_error(error: RedisError) -> ItemStoreError {
    if error.is_io_error() || error.is_connection_dropped() || error.is_timeout() {
        ItemStoreError::connection(error.to_string())
    } else {
        ItemStoreError::query(error.to_string())
    }
}

impl RedisItemStore {
    /// Build the connection pool described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ItemStoreError::Connection`] when the URL is invalid or the
    /// pool cannot be built.
    pub async fn connect(config: RedisStoreConfig) -> Result<Self, ItemStoreError> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|err| ItemStoreError::connection(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| ItemStoreError::connection(err.to_string()))?;
        Ok(Self {
            pool,
            keys: KeySpace::new(config.namespace),
            put_script: redis::Script::new(scripts::PUT_ITEM),
        })
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, ItemStoreError> {
        self.pool
            .get()
            .await
            .map_err(|err| ItemStoreError::connection(err.to_string()))
    }

    /// Read the watched attribute and compute its new value.
    ///
    /// Every error leaves the key watched; the caller must release it.
    async fn watched_sum(
        conn: &mut PooledConnection<'_, RedisConnectionManager>,
        table: Table,
        key: &str,
        item_key: &str,
        attribute: &str,
        amount: Decimal,
    ) -> Result<Decimal, ItemStoreError> {
        let (exists, raw): (bool, Option<String>) = redis::pipe()
            .cmd("EXISTS")
            .arg(item_key)
            .cmd("HGET")
            .arg(item_key)
            .arg(attribute)
            .query_async(&mut **conn)
            .await
            .map_err(command_error)?;

        if !exists {
            return Err(ItemStoreError::missing_item(table.name(), key));
        }
        let current = match raw.as_deref().map(decode_value).transpose()? {
            None => Decimal::ZERO,
            Some(AttributeValue::N(value)) => value,
            Some(AttributeValue::S(_)) => {
                return Err(ItemStoreError::rejected(format!(
                    "attribute `{attribute}` is not numeric"
                )));
            }
        };
        current.checked_add(amount).ok_or_else(|| {
            ItemStoreError::rejected(format!("attribute `{attribute}` would overflow"))
        })
    }

    async fn unwatch(conn: &mut PooledConnection<'_, RedisConnectionManager>) {
        let outcome: Result<(), RedisError> = redis::cmd("UNWATCH").query_async(&mut **conn).await;
        if let Err(err) = outcome {
            warn!(error = %err, "failed to release redis watch");
        }
    }
}

#[async_trait]
impl ItemStore for RedisItemStore {
    async fn put(&self, table: Table, item: Item) -> Result<(), ItemStoreError> {
        let key = item
            .get(table.key_attribute())
            .and_then(AttributeValue::as_s)
            .map(str::to_owned)
            .ok_or_else(|| {
                ItemStoreError::rejected(format!(
                    "item for {table} lacks string key attribute `{}`",
                    table.key_attribute()
                ))
            })?;
        let (indexed, prefix) = match table.index() {
            Some((index, attribute)) => (attribute, self.keys.index_prefix(table, index)),
            None => ("", String::new()),
        };

        let mut invocation = self.put_script.prepare_invoke();
        invocation
            .key(self.keys.item(table, &key))
            .key(self.keys.insertion_counter(table))
            .arg(indexed)
            .arg(prefix)
            .arg(key.as_str())
            .arg(encode_item(&item));

        let mut conn = self.connection().await?;
        let _: i64 = invocation
            .invoke_async(&mut *conn)
            .await
            .map_err(command_error)?;
        debug!(table = %table, "item stored");
        Ok(())
    }

    async fn get(&self, table: Table, key: &str) -> Result<Option<Item>, ItemStoreError> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(self.keys.item(table, key))
            .query_async(&mut *conn)
            .await
            .map_err(command_error)?;
        decode_item(fields)
    }

    async fn query(
        &self,
        table: Table,
        index: &str,
        key_field: &str,
        key_value: &str,
    ) -> Result<Vec<Item>, ItemStoreError> {
        if table.index() != Some((index, key_field)) {
            return Err(ItemStoreError::query(format!(
                "{table} has no index `{index}` on `{key_field}`"
            )));
        }
        let mut conn = self.connection().await?;
        let members: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.keys.index(table, index, key_value))
            .arg(0)
            .arg(-1)
            .query_async(&mut *conn)
            .await
            .map_err(command_error)?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipeline = redis::pipe();
        for member in &members {
            pipeline.cmd("HGETALL").arg(self.keys.item(table, member));
        }
        let replies: Vec<HashMap<String, String>> = pipeline
            .query_async(&mut *conn)
            .await
            .map_err(command_error)?;

        let mut items = Vec::with_capacity(replies.len());
        for reply in replies {
            if let Some(item) = decode_item(reply)? {
                items.push(item);
            }
        }
        Ok(items)
    }

    async fn update(
        &self,
        table: Table,
        key: &str,
        expression: UpdateExpression,
    ) -> Result<(), ItemStoreError> {
        let UpdateExpression::Add { attribute, amount } = expression;
        let item_key = self.keys.item(table, key);
        let mut conn = self.connection().await?;

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let _: () = redis::cmd("WATCH")
                .arg(&item_key)
                .query_async(&mut *conn)
                .await
                .map_err(command_error)?;
            let updated =
                match Self::watched_sum(&mut conn, table, key, &item_key, &attribute, amount).await
                {
                    Ok(updated) => updated,
                    Err(err) => {
                        Self::unwatch(&mut conn).await;
                        return Err(err);
                    }
                };

            let committed: Option<(i64,)> = redis::pipe()
                .atomic()
                .cmd("HSET")
                .arg(&item_key)
                .arg(&attribute)
                .arg(encode_value(&AttributeValue::N(updated)))
                .query_async(&mut *conn)
                .await
                .map_err(command_error)?;
            if committed.is_some() {
                return Ok(());
            }
            debug!(table = %table, attempt, "concurrent write; retrying add");
        }

        Err(ItemStoreError::rejected(format!(
            "gave up after {MAX_UPDATE_ATTEMPTS} contended attempts on {table}"
        )))
    }

    async fn next_sequence(&self, name: &str) -> Result<u64, ItemStoreError> {
        let mut conn = self.connection().await?;
        redis::cmd("INCR")
            .arg(self.keys.sequence(name))
            .query_async(&mut *conn)
            .await
            .map_err(command_error)
    }
}
