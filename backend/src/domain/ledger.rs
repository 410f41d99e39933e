//! Account ledger domain service.
//!
//! Balance changes compile to a single atomic add at the store; the service
//! never reads a balance back to write it again. Ledger entries receive
//! time-ordered composite identifiers built from the injected clock and a
//! store-side sequence.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::ports::AccountLedger;
use crate::domain::store::map_store_error;
use crate::domain::{Account, Error, LedgerStore, TransactionEntry, TransactionId, UserId};

/// Account ledger service implementing [`AccountLedger`].
#[derive(Clone)]
pub struct AccountLedgerService {
    store: LedgerStore,
    clock: Arc<dyn Clock>,
}

impl AccountLedgerService {
    /// Create a service over `store` stamping entries with `clock`.
    pub fn new(store: LedgerStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn next_transaction_id(&self) -> Result<TransactionId, Error> {
        let sequence = self
            .store
            .next_transaction_sequence()
            .await
            .map_err(map_store_error)?;
        Ok(TransactionId::compose(
            self.clock.utc().timestamp_millis(),
            sequence,
        ))
    }
}

#[async_trait]
impl AccountLedger for AccountLedgerService {
    async fn create_account(&self, account: Account) -> Result<(), Error> {
        self.store
            .put_account(&account)
            .await
            .map_err(map_store_error)?;
        info!(user_id = %account.user_id, "account created");
        Ok(())
    }

    async fn get_account(&self, user_id: &UserId) -> Result<Account, Error> {
        self.store
            .get_account(user_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn adjust_balance(&self, user_id: &UserId, amount: Decimal) -> Result<(), Error> {
        self.store
            .add_to_wallet(user_id, amount)
            .await
            .map_err(map_store_error)?;
        debug!(user_id = %user_id, %amount, "wallet adjusted");
        Ok(())
    }

    async fn record_transaction(
        &self,
        user_id: &UserId,
        amount: Decimal,
        description: &str,
    ) -> Result<TransactionId, Error> {
        let entry = TransactionEntry {
            transaction_id: self.next_transaction_id().await?,
            user_id: user_id.clone(),
            amount,
            description: description.to_owned(),
        };
        self.store
            .put_transaction(&entry)
            .await
            .map_err(map_store_error)?;
        debug!(
            user_id = %user_id,
            transaction_id = %entry.transaction_id,
            %amount,
            "transaction recorded"
        );
        Ok(entry.transaction_id)
    }

    async fn get_history(&self, user_id: &UserId) -> Result<Vec<TransactionEntry>, Error> {
        self.store
            .transactions_for(user_id)
            .await
            .map_err(map_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ItemStoreError, MockItemStore};
    use crate::domain::{ErrorCode, Item, Table, UpdateExpression};
    use crate::test_support::FixtureClock;
    use mockall::predicate::{always, eq};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn user(raw: &str) -> UserId {
        UserId::new(raw).expect("valid user id")
    }

    fn fixed_clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock::at_millis(1_700_000_000_123))
    }

    fn service(items: MockItemStore) -> AccountLedgerService {
        AccountLedgerService::new(LedgerStore::new(Arc::new(items)), fixed_clock())
    }

    #[tokio::test]
    async fn get_account_reports_missing_user() {
        let mut items = MockItemStore::new();
        items.expect_get().return_once(|_, _| Ok(None));

        let error = service(items)
            .get_account(&user("ghost"))
            .await
            .expect_err("missing account");
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.message(), "user not found");
    }

    #[rstest]
    #[case(dec!(10))]
    #[case(dec!(-3.75))]
    #[tokio::test]
    async fn adjust_balance_delegates_atomic_add(#[case] amount: Decimal) {
        let mut items = MockItemStore::new();
        items.expect_get().never();
        items
            .expect_update()
            .with(
                eq(Table::Users),
                eq("u1"),
                eq(UpdateExpression::Add {
                    attribute: "wallet_amount".to_owned(),
                    amount,
                }),
            )
            .times(1)
            .return_once(|_, _, _| Ok(()));

        service(items)
            .adjust_balance(&user("u1"), amount)
            .await
            .expect("adjust succeeds");
    }

    #[rstest]
    #[case(ItemStoreError::missing_item("users", "ghost"), ErrorCode::NotFound)]
    #[case(ItemStoreError::rejected("wallet_amount is not numeric"), ErrorCode::StoreFailure)]
    #[case(ItemStoreError::connection("timeout"), ErrorCode::StoreFailure)]
    #[tokio::test]
    async fn adjust_balance_maps_store_errors(
        #[case] failure: ItemStoreError,
        #[case] expected: ErrorCode,
    ) {
        let mut items = MockItemStore::new();
        items.expect_update().return_once(move |_, _, _| Err(failure));

        let error = service(items)
            .adjust_balance(&user("ghost"), dec!(1))
            .await
            .expect_err("adjust fails");
        assert_eq!(error.code(), expected);
    }

    #[tokio::test]
    async fn record_transaction_composes_clock_and_sequence() {
        let mut items = MockItemStore::new();
        items
            .expect_next_sequence()
            .with(eq("transactions"))
            .return_once(|_| Ok(42));
        items
            .expect_put()
            .with(
                eq(Table::Transactions),
                eq(Item::new()
                    .with_s("transaction_id", "1700000000123-0000000042")
                    .with_s("user_id", "u1")
                    .with_n("amount", dec!(-0.5))
                    .with_s("description", "api call cost")),
            )
            .times(1)
            .return_once(|_, _| Ok(()));

        let id = service(items)
            .record_transaction(&user("u1"), dec!(-0.5), "api call cost")
            .await
            .expect("record succeeds");
        assert_eq!(id.as_ref(), "1700000000123-0000000042");
    }

    #[tokio::test]
    async fn record_transaction_skips_put_when_sequence_fails() {
        let mut items = MockItemStore::new();
        items
            .expect_next_sequence()
            .return_once(|_| Err(ItemStoreError::connection("reset")));
        items.expect_put().with(always(), always()).never();

        let error = service(items)
            .record_transaction(&user("u1"), dec!(1), "manual")
            .await
            .expect_err("sequence fails");
        assert_eq!(error.code(), ErrorCode::StoreFailure);
    }

    #[tokio::test]
    async fn get_history_is_empty_not_error() {
        let mut items = MockItemStore::new();
        items.expect_query().return_once(|_, _, _, _| Ok(Vec::new()));

        let history = service(items)
            .get_history(&user("u1"))
            .await
            .expect("history succeeds");
        assert!(history.is_empty());
    }
}
