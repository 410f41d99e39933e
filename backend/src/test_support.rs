//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! when the `test-support` feature is enabled.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{CostSampler, ItemStore, ItemStoreError, WorkSleeper};
use crate::domain::{Item, LedgerServices, MeteredCallRuntime, Table, UpdateExpression};
use crate::outbound::memory::InMemoryItemStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Clock frozen at a chosen instant, advanced explicitly by tests.
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    /// Clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock frozen at `millis` since the Unix epoch.
    pub fn at_millis(millis: i64) -> Self {
        let now = match Utc.timestamp_millis_opt(millis).single() {
            Some(now) => now,
            None => panic!("timestamp out of range: {millis}"),
        };
        Self::new(now)
    }

    /// Move the clock forward by `millis`.
    pub fn advance_millis(&self, millis: i64) {
        *lock(&self.0) += TimeDelta::milliseconds(millis);
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Sleeper that returns at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl WorkSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that returns at once and remembers every requested duration.
#[derive(Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Durations requested so far, oldest first.
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.0).clone()
    }
}

#[async_trait]
impl WorkSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.0).push(duration);
    }
}

/// Cost sampler that always returns the wrapped number of milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct FixedCostSampler(pub u32);

impl CostSampler for FixedCostSampler {
    fn sample_millis(&self) -> u32 {
        self.0
    }
}

/// Item store operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Put,
    Get,
    Query,
    Update,
    NextSequence,
}

struct Fault {
    operation: StoreOperation,
    table: Option<Table>,
    error: ItemStoreError,
}

/// Item store wrapper that counts calls and fails chosen operations.
///
/// Faults stay armed until [`ScriptedItemStore::clear_faults`] is called.
pub struct ScriptedItemStore {
    inner: Arc<dyn ItemStore>,
    faults: Mutex<Vec<Fault>>,
    calls: Mutex<Vec<(StoreOperation, Option<Table>)>>,
}

impl ScriptedItemStore {
    /// Wrap `inner` with no faults armed.
    pub fn new(inner: Arc<dyn ItemStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every `operation` on `table` with `error`.
    ///
    /// A `None` table matches any table, and is the only match for
    /// [`StoreOperation::NextSequence`].
    pub fn fail(&self, operation: StoreOperation, table: Option<Table>, error: ItemStoreError) {
        lock(&self.faults).push(Fault {
            operation,
            table,
            error,
        });
    }

    /// Disarm every fault.
    pub fn clear_faults(&self) {
        lock(&self.faults).clear();
    }

    /// Every call observed so far, including failed ones.
    pub fn calls(&self) -> Vec<(StoreOperation, Option<Table>)> {
        lock(&self.calls).clone()
    }

    fn observe(&self, operation: StoreOperation, table: Option<Table>) -> Result<(), ItemStoreError> {
        lock(&self.calls).push((operation, table));
        let faults = lock(&self.faults);
        let matching = faults.iter().find(|fault| {
            fault.operation == operation && (fault.table.is_none() || fault.table == table)
        });
        match matching {
            Some(fault) => Err(fault.error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ItemStore for ScriptedItemStore {
    async fn put(&self, table: Table, item: Item) -> Result<(), ItemStoreError> {
        self.observe(StoreOperation::Put, Some(table))?;
        self.inner.put(table, item).await
    }

    async fn get(&self, table: Table, key: &str) -> Result<Option<Item>, ItemStoreError> {
        self.observe(StoreOperation::Get, Some(table))?;
        self.inner.get(table, key).await
    }

    async fn query(
        &self,
        table: Table,
        index: &str,
        key_field: &str,
        key_value: &str,
    ) -> Result<Vec<Item>, ItemStoreError> {
        self.observe(StoreOperation::Query, Some(table))?;
        self.inner.query(table, index, key_field, key_value).await
    }

    async fn update(
        &self,
        table: Table,
        key: &str,
        expression: UpdateExpression,
    ) -> Result<(), ItemStoreError> {
        self.observe(StoreOperation::Update, Some(table))?;
        self.inner.update(table, key, expression).await
    }

    async fn next_sequence(&self, name: &str) -> Result<u64, ItemStoreError> {
        self.observe(StoreOperation::NextSequence, None)?;
        self.inner.next_sequence(name).await
    }
}

/// Instant used by [`fixture_services`] for transaction identifiers.
pub const FIXTURE_EPOCH_MILLIS: i64 = 1_700_000_000_000;

/// Services over `items` with a frozen clock, no real sleeping, and every
/// metered call costing `cost_millis`.
pub fn fixture_services(items: Arc<dyn ItemStore>, cost_millis: u32) -> LedgerServices {
    LedgerServices::with_runtime(
        items,
        Arc::new(FixtureClock::at_millis(FIXTURE_EPOCH_MILLIS)),
        MeteredCallRuntime {
            sleeper: Arc::new(ImmediateSleeper),
            sampler: Arc::new(FixedCostSampler(cost_millis)),
        },
    )
}

/// [`fixture_services`] over a fresh [`InMemoryItemStore`].
pub fn memory_services(cost_millis: u32) -> LedgerServices {
    fixture_services(Arc::new(InMemoryItemStore::new()), cost_millis)
}
