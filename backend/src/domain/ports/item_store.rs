//! Port for the remote key-value substrate.
//!
//! The [`ItemStore`] trait is the only storage seam in the crate. Adapters map
//! it onto a concrete substrate (an in-process map for tests, Redis for
//! deployments) while honouring the same per-record atomicity contract.

use async_trait::async_trait;

use crate::domain::{Item, Table, UpdateExpression};

use super::define_port_error;

define_port_error! {
    /// Errors raised by item store adapters.
    pub enum ItemStoreError {
        /// Substrate connection could not be established.
        Connection { message: String } =>
            "item store connection failed: {message}",
        /// Read or write failed during execution.
        Query { message: String } =>
            "item store query failed: {message}",
        /// A conditional update targeted an item that does not exist.
        MissingItem { table: String, key: String } =>
            "no item in {table} with key {key}",
        /// The substrate refused the mutation (for example a non-numeric add).
        Rejected { message: String } =>
            "item store rejected the update: {message}",
        /// Stored data could not be decoded into the item model.
        Decode { message: String } =>
            "item store returned undecodable data: {message}",
    }
}

/// Port over the key-value substrate.
///
/// # Consistency
///
/// - `put` overwrites any item stored under the same primary key.
/// - `update` is atomic per item: concurrent adds on one attribute all apply.
/// - `query` returns items in the substrate's natural order; adapters in this
///   crate use insertion order.
/// - `next_sequence` never returns the same value twice for a given name.
///
/// Adapters never retry internally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Store `item`, replacing any item with the same primary key.
    async fn put(&self, table: Table, item: Item) -> Result<(), ItemStoreError>;

    /// Fetch the item stored under `key`, or `None` when absent.
    async fn get(&self, table: Table, key: &str) -> Result<Option<Item>, ItemStoreError>;

    /// Return every item whose `key_field` equals `key_value` through `index`.
    ///
    /// Fails with [`ItemStoreError::Query`] when `table` has no such index.
    async fn query(
        &self,
        table: Table,
        index: &str,
        key_field: &str,
        key_value: &str,
    ) -> Result<Vec<Item>, ItemStoreError>;

    /// Apply `expression` to the item stored under `key`.
    ///
    /// Fails with [`ItemStoreError::MissingItem`] when the item does not exist
    /// and with [`ItemStoreError::Rejected`] when the target attribute is not
    /// numeric.
    async fn update(
        &self,
        table: Table,
        key: &str,
        expression: UpdateExpression,
    ) -> Result<(), ItemStoreError>;

    /// Atomically increment and return the counter called `name`.
    ///
    /// The first call for a name returns 1.
    async fn next_sequence(&self, name: &str) -> Result<u64, ItemStoreError>;
}
