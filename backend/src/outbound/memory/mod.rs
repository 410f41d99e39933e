//! In-process item store.
//!
//! Holds every table in a single mutex-guarded map. Each operation takes the
//! lock once, so updates are atomic per item exactly as the port requires.
//! Used by tests and by local runs without a Redis URL.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::ports::{ItemStore, ItemStoreError};
use crate::domain::{AttributeValue, Item, Table, UpdateExpression};

#[derive(Default)]
struct StoredTable {
    /// Primary key -> (insertion position, item).
    items: HashMap<String, (u64, Item)>,
    next_position: u64,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Table, StoredTable>,
    sequences: HashMap<String, u64>,
}

/// [`ItemStore`] backed by process memory.
///
/// # Examples
/// ```
/// use ledger_backend::domain::ports::ItemStore;
/// use ledger_backend::domain::{Item, Table};
/// use ledger_backend::outbound::memory::InMemoryItemStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemoryItemStore::new();
/// let item = Item::new().with_s("user_id", "u1").with_s("email", "");
/// store.put(Table::Users, item.clone()).await.expect("put");
/// assert_eq!(store.get(Table::Users, "u1").await.expect("get"), Some(item));
/// # });
/// ```
#[derive(Default)]
pub struct InMemoryItemStore {
    state: Mutex<MemoryState>,
}

impl InMemoryItemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, ItemStoreError> {
        self.state
            .lock()
            .map_err(|_| ItemStoreError::query("in-memory store lock poisoned"))
    }
}

fn primary_key(table: Table, item: &Item) -> Result<String, ItemStoreError> {
    item.get(table.key_attribute())
        .and_then(AttributeValue::as_s)
        .map(str::to_owned)
        .ok_or_else(|| {
            ItemStoreError::rejected(format!(
                "item for {table} lacks string key attribute `{}`",
                table.key_attribute()
            ))
        })
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn put(&self, table: Table, item: Item) -> Result<(), ItemStoreError> {
        let key = primary_key(table, &item)?;
        let mut state = self.lock()?;
        let stored = state.tables.entry(table).or_default();
        let position = match stored.items.get(&key) {
            Some((position, _)) => *position,
            None => {
                stored.next_position += 1;
                stored.next_position
            }
        };
        stored.items.insert(key, (position, item));
        Ok(())
    }

    async fn get(&self, table: Table, key: &str) -> Result<Option<Item>, ItemStoreError> {
        let state = self.lock()?;
        Ok(state
            .tables
            .get(&table)
            .and_then(|stored| stored.items.get(key))
            .map(|(_, item)| item.clone()))
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
        let state = self.lock()?;
        let Some(stored) = state.tables.get(&table) else {
            return Ok(Vec::new());
        };
        let mut matches: Vec<_> = stored
            .items
            .values()
            .filter(|(_, item)| {
                item.get(key_field).and_then(AttributeValue::as_s) == Some(key_value)
            })
            .collect();
        matches.sort_by_key(|(position, _)| *position);
        Ok(matches.into_iter().map(|(_, item)| item.clone()).collect())
    }

    async fn update(
        &self,
        table: Table,
        key: &str,
        expression: UpdateExpression,
    ) -> Result<(), ItemStoreError> {
        let UpdateExpression::Add { attribute, amount } = expression;
        let mut state = self.lock()?;
        let item = state
            .tables
            .get_mut(&table)
            .and_then(|stored| stored.items.get_mut(key))
            .map(|(_, item)| item)
            .ok_or_else(|| ItemStoreError::missing_item(table.name(), key))?;

        let current = match item.get(&attribute) {
            None => Decimal::ZERO,
            Some(AttributeValue::N(value)) => *value,
            Some(AttributeValue::S(_)) => {
                return Err(ItemStoreError::rejected(format!(
                    "attribute `{attribute}` is not numeric"
                )));
            }
        };
        let updated = current.checked_add(amount).ok_or_else(|| {
            ItemStoreError::rejected(format!("attribute `{attribute}` would overflow"))
        })?;
        item.insert(attribute, AttributeValue::N(updated));
        Ok(())
    }

    async fn next_sequence(&self, name: &str) -> Result<u64, ItemStoreError> {
        let mut state = self.lock()?;
        let counter = state.sequences.entry(name.to_owned()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
