//! Typed store adapter over the generic [`ItemStore`] port.
//!
//! [`LedgerStore`] owns the mapping between accounts, credentials and ledger
//! entries and the substrate's flat [`Item`]s. It adds no behaviour beyond the
//! translation: errors surface unchanged and nothing is retried.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::ports::{ItemStore, ItemStoreError};
use crate::domain::{
    Account, ApiKey, AttributeValue, Credential, Error, Item, Table, TransactionEntry,
    TransactionId, USER_ID_ATTRIBUTE, USER_ID_INDEX, UpdateExpression, UserId,
};

const EMAIL: &str = "email";
const WALLET_AMOUNT: &str = "wallet_amount";
const AMOUNT: &str = "amount";
const DESCRIPTION: &str = "description";

/// Counter backing transaction identifier sequences.
pub const TRANSACTION_SEQUENCE: &str = "transactions";

/// Entity-level facade over an [`ItemStore`].
#[derive(Clone)]
pub struct LedgerStore {
    items: Arc<dyn ItemStore>,
}

impl LedgerStore {
    /// Wrap an item store.
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }

    /// Write an account, replacing any previous record.
    pub async fn put_account(&self, account: &Account) -> Result<(), ItemStoreError> {
        self.items.put(Table::Users, encode_account(account)).await
    }

    /// Read an account, or `None` when it does not exist.
    pub async fn get_account(&self, user_id: &UserId) -> Result<Option<Account>, ItemStoreError> {
        self.items
            .get(Table::Users, user_id.as_ref())
            .await?
            .map(|item| decode_account(&item))
            .transpose()
    }

    /// Atomically add `amount` to the account's wallet.
    pub async fn add_to_wallet(
        &self,
        user_id: &UserId,
        amount: Decimal,
    ) -> Result<(), ItemStoreError> {
        let expression = UpdateExpression::Add {
            attribute: WALLET_AMOUNT.to_owned(),
            amount,
        };
        self.items
            .update(Table::Users, user_id.as_ref(), expression)
            .await
    }

    /// Write a key binding.
    pub async fn put_credential(&self, credential: &Credential) -> Result<(), ItemStoreError> {
        let item = Item::new()
            .with_s(Table::ApiKeys.key_attribute(), credential.api_key.expose())
            .with_s(USER_ID_ATTRIBUTE, credential.user_id.as_ref());
        self.items.put(Table::ApiKeys, item).await
    }

    /// Read the binding for one key.
    pub async fn get_credential(
        &self,
        api_key: &ApiKey,
    ) -> Result<Option<Credential>, ItemStoreError> {
        self.items
            .get(Table::ApiKeys, api_key.expose())
            .await?
            .map(|item| decode_credential(&item))
            .transpose()
    }

    /// Credentials bound to `user_id`, in index order.
    pub async fn credentials_for(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Credential>, ItemStoreError> {
        self.items
            .query(Table::ApiKeys, USER_ID_INDEX, USER_ID_ATTRIBUTE, user_id.as_ref())
            .await?
            .iter()
            .map(decode_credential)
            .collect()
    }

    /// Draw the next value of the transaction sequence.
    pub async fn next_transaction_sequence(&self) -> Result<u64, ItemStoreError> {
        self.items.next_sequence(TRANSACTION_SEQUENCE).await
    }

    /// Append one ledger entry.
    pub async fn put_transaction(&self, entry: &TransactionEntry) -> Result<(), ItemStoreError> {
        let item = Item::new()
            .with_s(
                Table::Transactions.key_attribute(),
                entry.transaction_id.as_ref(),
            )
            .with_s(USER_ID_ATTRIBUTE, entry.user_id.as_ref())
            .with_n(AMOUNT, entry.amount)
            .with_s(DESCRIPTION, entry.description.as_str());
        self.items.put(Table::Transactions, item).await
    }

    /// Ledger entries for `user_id`, in index order.
    pub async fn transactions_for(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<TransactionEntry>, ItemStoreError> {
        self.items
            .query(
                Table::Transactions,
                USER_ID_INDEX,
                USER_ID_ATTRIBUTE,
                user_id.as_ref(),
            )
            .await?
            .iter()
            .map(decode_transaction)
            .collect()
    }
}

/// Map a store failure onto the domain taxonomy.
///
/// A conditional update on an absent item means the caller named an account
/// that does not exist; everything else is a store failure.
pub(crate) fn map_store_error(error: ItemStoreError) -> Error {
    match error {
        ItemStoreError::MissingItem { .. } => Error::not_found("user not found"),
        other => Error::store_failure(other.to_string()),
    }
}

fn encode_account(account: &Account) -> Item {
    Item::new()
        .with_s(Table::Users.key_attribute(), account.user_id.as_ref())
        .with_s(EMAIL, account.email.as_str())
        .with_n(WALLET_AMOUNT, account.wallet_amount)
}

fn decode_account(item: &Item) -> Result<Account, ItemStoreError> {
    Ok(Account {
        user_id: user_id_field(item, Table::Users.key_attribute())?,
        email: string_field(item, EMAIL)?.to_owned(),
        wallet_amount: number_field(item, WALLET_AMOUNT)?,
    })
}

fn decode_credential(item: &Item) -> Result<Credential, ItemStoreError> {
    let raw = string_field(item, Table::ApiKeys.key_attribute())?;
    let api_key = ApiKey::new(raw).map_err(|err| ItemStoreError::decode(err.to_string()))?;
    Ok(Credential {
        api_key,
        user_id: user_id_field(item, USER_ID_ATTRIBUTE)?,
    })
}

fn decode_transaction(item: &Item) -> Result<TransactionEntry, ItemStoreError> {
    Ok(TransactionEntry {
        transaction_id: TransactionId::from_stored(string_field(
            item,
            Table::Transactions.key_attribute(),
        )?),
        user_id: user_id_field(item, USER_ID_ATTRIBUTE)?,
        amount: number_field(item, AMOUNT)?,
        description: string_field(item, DESCRIPTION)?.to_owned(),
    })
}

fn string_field<'a>(item: &'a Item, name: &str) -> Result<&'a str, ItemStoreError> {
    item.get(name)
        .and_then(AttributeValue::as_s)
        .ok_or_else(|| ItemStoreError::decode(format!("missing string attribute `{name}`")))
}

fn number_field(item: &Item, name: &str) -> Result<Decimal, ItemStoreError> {
    item.get(name)
        .and_then(AttributeValue::as_n)
        .ok_or_else(|| ItemStoreError::decode(format!("missing numeric attribute `{name}`")))
}

fn user_id_field(item: &Item, name: &str) -> Result<UserId, ItemStoreError> {
    UserId::new(string_field(item, name)?).map_err(|err| ItemStoreError::decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockItemStore;
    use mockall::predicate::{always, eq};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn user(raw: &str) -> UserId {
        UserId::new(raw).expect("valid user id")
    }

    #[tokio::test]
    async fn put_account_writes_users_item() {
        let mut items = MockItemStore::new();
        items
            .expect_put()
            .with(
                eq(Table::Users),
                eq(Item::new()
                    .with_s("user_id", "u1")
                    .with_s("email", "a@b.com")
                    .with_n("wallet_amount", dec!(0))),
            )
            .times(1)
            .return_once(|_, _| Ok(()));

        let store = LedgerStore::new(Arc::new(items));
        let account = Account::new(user("u1"), "a@b.com", dec!(0));
        store.put_account(&account).await.expect("put succeeds");
    }

    #[tokio::test]
    async fn add_to_wallet_issues_add_expression() {
        let mut items = MockItemStore::new();
        items
            .expect_update()
            .with(
                eq(Table::Users),
                eq("u1"),
                eq(UpdateExpression::Add {
                    attribute: "wallet_amount".to_owned(),
                    amount: dec!(-0.25),
                }),
            )
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let store = LedgerStore::new(Arc::new(items));
        store
            .add_to_wallet(&user("u1"), dec!(-0.25))
            .await
            .expect("update succeeds");
    }

    #[tokio::test]
    async fn get_account_maps_absent_item_to_none() {
        let mut items = MockItemStore::new();
        items
            .expect_get()
            .with(eq(Table::Users), eq("ghost"))
            .return_once(|_, _| Ok(None));

        let store = LedgerStore::new(Arc::new(items));
        let account = store.get_account(&user("ghost")).await.expect("lookup");
        assert!(account.is_none());
    }

    #[tokio::test]
    async fn get_account_rejects_item_without_wallet() {
        let mut items = MockItemStore::new();
        items.expect_get().return_once(|_, _| {
            Ok(Some(
                Item::new().with_s("user_id", "u1").with_s("email", "a@b.com"),
            ))
        });

        let store = LedgerStore::new(Arc::new(items));
        let error = store
            .get_account(&user("u1"))
            .await
            .expect_err("decode fails");
        assert!(matches!(error, ItemStoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn credentials_for_queries_user_index() {
        let mut items = MockItemStore::new();
        items
            .expect_query()
            .with(
                eq(Table::ApiKeys),
                eq(USER_ID_INDEX),
                eq(USER_ID_ATTRIBUTE),
                eq("u1"),
            )
            .return_once(|_, _, _, _| {
                Ok(vec![
                    Item::new().with_s("api_key", "K1").with_s("user_id", "u1"),
                    Item::new().with_s("api_key", "K2").with_s("user_id", "u1"),
                ])
            });

        let store = LedgerStore::new(Arc::new(items));
        let credentials = store.credentials_for(&user("u1")).await.expect("query");
        let keys: Vec<_> = credentials.iter().map(|c| c.api_key.expose()).collect();
        assert_eq!(keys, ["K1", "K2"]);
    }

    #[rstest]
    #[tokio::test]
    async fn store_errors_pass_through_unchanged() {
        let mut items = MockItemStore::new();
        items
            .expect_query()
            .with(eq(Table::Transactions), always(), always(), always())
            .return_once(|_, _, _, _| Err(ItemStoreError::connection("reset")));

        let store = LedgerStore::new(Arc::new(items));
        let error = store
            .transactions_for(&user("u1"))
            .await
            .expect_err("query fails");
        assert_eq!(error, ItemStoreError::connection("reset"));
    }

    #[tokio::test]
    async fn transactions_round_trip_through_items() {
        let entry = TransactionEntry {
            transaction_id: TransactionId::compose(1_700_000_000_000, 1),
            user_id: user("u1"),
            amount: dec!(-0.5),
            description: "api call cost".to_owned(),
        };
        let mut items = MockItemStore::new();
        let stored = std::sync::Arc::new(std::sync::Mutex::new(None));
        let sink = Arc::clone(&stored);
        items
            .expect_put()
            .with(eq(Table::Transactions), always())
            .return_once(move |_, item| {
                *sink.lock().expect("sink") = Some(item);
                Ok(())
            });
        let source = Arc::clone(&stored);
        items.expect_query().return_once(move |_, _, _, _| {
            Ok(source.lock().expect("source").clone().into_iter().collect())
        });

        let store = LedgerStore::new(Arc::new(items));
        store.put_transaction(&entry).await.expect("put");
        let history = store.transactions_for(&user("u1")).await.expect("query");
        assert_eq!(history, vec![entry]);
    }
}
