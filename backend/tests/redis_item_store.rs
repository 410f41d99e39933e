//! Redis item store behaviour against a live server.
//!
//! Set `LEDGER_TEST_REDIS_URL` (for example `redis://127.0.0.1:6379/`) to run
//! these tests. Without it every test prints a skip marker and returns. Each
//! test writes under a fresh namespace so runs never see each other's keys.

use std::sync::Arc;

use bb8_redis::redis::{self, AsyncCommands};
use futures::future::join_all;
use ledger_backend::domain::ports::{ItemStore, ItemStoreError};
use ledger_backend::domain::{Account, Item, Table, UpdateExpression, UserId};
use ledger_backend::outbound::redis::{RedisItemStore, RedisStoreConfig};
use ledger_backend::test_support::fixture_services;
use rstest::{fixture, rstest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

const REDIS_URL_VAR: &str = "LEDGER_TEST_REDIS_URL";
const WALLET: &str = "wallet_amount";

struct RedisContext {
    url: String,
    namespace: String,
    store: RedisItemStore,
}

impl RedisContext {
    /// Raw hash key the store uses for `key` in `table`.
    fn item_key(&self, table: Table, key: &str) -> String {
        format!("{}:{}:item:{key}", self.namespace, table.name())
    }

    async fn raw_connection(&self) -> redis::aio::MultiplexedConnection {
        redis::Client::open(self.url.as_str())
            .expect("valid redis url")
            .get_multiplexed_async_connection()
            .await
            .expect("redis reachable")
    }
}

/// Store on a fresh namespace, or `None` when no server is configured.
#[fixture]
async fn redis_context() -> Option<RedisContext> {
    let Ok(url) = std::env::var(REDIS_URL_VAR) else {
        eprintln!("SKIP-REDIS: {REDIS_URL_VAR} is unset");
        return None;
    };
    let namespace = format!("ledger-test-{}", Uuid::new_v4());
    let config = RedisStoreConfig::new(url.as_str())
        .with_namespace(namespace.as_str())
        .with_max_size(8);
    let store = RedisItemStore::connect(config)
        .await
        .unwrap_or_else(|err| panic!("{REDIS_URL_VAR} is set but unusable: {err}"));
    Some(RedisContext {
        url,
        namespace,
        store,
    })
}

fn account_item(user_id: &str, wallet: Decimal) -> Item {
    Item::new()
        .with_s(Table::Users.key_attribute(), user_id)
        .with_n(WALLET, wallet)
}

fn credential_item(api_key: &str, user_id: &str) -> Item {
    let (_, field) = Table::ApiKeys.index().expect("api keys are indexed");
    Item::new()
        .with_s(Table::ApiKeys.key_attribute(), api_key)
        .with_s(field, user_id)
}

async fn keys_for(store: &RedisItemStore, user_id: &str) -> Vec<String> {
    let (index, field) = Table::ApiKeys.index().expect("api keys are indexed");
    store
        .query(Table::ApiKeys, index, field, user_id)
        .await
        .expect("query succeeds")
        .iter()
        .filter_map(|item| item.get(Table::ApiKeys.key_attribute()))
        .filter_map(|value| value.as_s().map(str::to_owned))
        .collect()
}

fn add(amount: Decimal) -> UpdateExpression {
    UpdateExpression::Add {
        attribute: WALLET.to_owned(),
        amount,
    }
}

#[rstest]
#[tokio::test]
async fn put_then_get_returns_the_item(#[future] redis_context: Option<RedisContext>) {
    let Some(ctx) = redis_context.await else {
        return;
    };
    let item = account_item("u1", dec!(10.125));

    ctx.store.put(Table::Users, item.clone()).await.expect("put");

    let stored = ctx.store.get(Table::Users, "u1").await.expect("get");
    assert_eq!(stored, Some(item));
    assert_eq!(ctx.store.get(Table::Users, "u2").await.expect("get"), None);
}

#[rstest]
#[tokio::test]
async fn query_returns_items_in_first_insertion_order(
    #[future] redis_context: Option<RedisContext>,
) {
    let Some(ctx) = redis_context.await else {
        return;
    };
    for api_key in ["k-b", "k-a", "k-c"] {
        ctx.store
            .put(Table::ApiKeys, credential_item(api_key, "u1"))
            .await
            .expect("put");
    }

    // Overwriting with the same indexed value keeps the original position.
    ctx.store
        .put(Table::ApiKeys, credential_item("k-b", "u1"))
        .await
        .expect("overwrite");

    assert_eq!(keys_for(&ctx.store, "u1").await, ["k-b", "k-a", "k-c"]);
}

#[rstest]
#[tokio::test]
async fn reindexed_item_moves_between_index_entries(
    #[future] redis_context: Option<RedisContext>,
) {
    let Some(ctx) = redis_context.await else {
        return;
    };
    for api_key in ["k1", "k2"] {
        ctx.store
            .put(Table::ApiKeys, credential_item(api_key, "u1"))
            .await
            .expect("put");
    }

    ctx.store
        .put(Table::ApiKeys, credential_item("k1", "u2"))
        .await
        .expect("rebind");

    assert_eq!(keys_for(&ctx.store, "u1").await, ["k2"]);
    assert_eq!(keys_for(&ctx.store, "u2").await, ["k1"]);
}

#[rstest]
#[tokio::test]
async fn query_on_an_unknown_index_is_a_query_error(
    #[future] redis_context: Option<RedisContext>,
) {
    let Some(ctx) = redis_context.await else {
        return;
    };

    let error = ctx
        .store
        .query(Table::Users, "email-index", "email", "a@example.com")
        .await
        .expect_err("users have no email index");

    assert!(matches!(error, ItemStoreError::Query { .. }), "{error:?}");
}

#[rstest]
#[tokio::test]
async fn update_adds_exact_decimals(#[future] redis_context: Option<RedisContext>) {
    let Some(ctx) = redis_context.await else {
        return;
    };
    ctx.store
        .put(Table::Users, account_item("u1", dec!(0.1)))
        .await
        .expect("put");

    ctx.store
        .update(Table::Users, "u1", add(dec!(0.2)))
        .await
        .expect("update");

    let stored = ctx.store.get(Table::Users, "u1").await.expect("get");
    let wallet = stored
        .and_then(|item| item.get(WALLET).and_then(|value| value.as_n()))
        .expect("wallet present");
    assert_eq!(wallet, dec!(0.3));
}

#[rstest]
#[tokio::test]
async fn update_on_a_missing_item_reports_missing_item(
    #[future] redis_context: Option<RedisContext>,
) {
    let Some(ctx) = redis_context.await else {
        return;
    };

    let error = ctx
        .store
        .update(Table::Users, "ghost", add(dec!(1)))
        .await
        .expect_err("item is absent");

    assert!(
        matches!(error, ItemStoreError::MissingItem { ref key, .. } if key == "ghost"),
        "{error:?}"
    );
    assert_eq!(ctx.store.get(Table::Users, "ghost").await.expect("get"), None);
}

#[rstest]
#[tokio::test]
async fn update_on_a_string_attribute_is_rejected(
    #[future] redis_context: Option<RedisContext>,
) {
    let Some(ctx) = redis_context.await else {
        return;
    };
    let item = Item::new()
        .with_s(Table::Users.key_attribute(), "u1")
        .with_s(WALLET, "lots");
    ctx.store.put(Table::Users, item.clone()).await.expect("put");

    let error = ctx
        .store
        .update(Table::Users, "u1", add(dec!(1)))
        .await
        .expect_err("string attribute");

    assert!(matches!(error, ItemStoreError::Rejected { .. }), "{error:?}");
    assert_eq!(
        ctx.store.get(Table::Users, "u1").await.expect("get"),
        Some(item)
    );
}

#[rstest]
#[tokio::test]
async fn undecodable_value_fails_and_the_pool_stays_usable(
    #[future] redis_context: Option<RedisContext>,
) {
    let Some(ctx) = redis_context.await else {
        return;
    };
    ctx.store
        .put(Table::Users, account_item("u1", dec!(5)))
        .await
        .expect("put");
    let mut raw = ctx.raw_connection().await;
    let _: () = raw
        .hset(ctx.item_key(Table::Users, "u1"), WALLET, "untagged")
        .await
        .expect("raw write");

    let error = ctx
        .store
        .update(Table::Users, "u1", add(dec!(1)))
        .await
        .expect_err("value lacks a type tag");
    assert!(matches!(error, ItemStoreError::Decode { .. }), "{error:?}");

    let _: () = raw
        .hset(ctx.item_key(Table::Users, "u1"), WALLET, "N:5")
        .await
        .expect("raw repair");
    for _ in 0..8 {
        ctx.store
            .update(Table::Users, "u1", add(dec!(1)))
            .await
            .expect("update after repair");
    }
    let wallet = ctx
        .store
        .get(Table::Users, "u1")
        .await
        .expect("get")
        .and_then(|item| item.get(WALLET).and_then(|value| value.as_n()));
    assert_eq!(wallet, Some(dec!(13)));
}

#[rstest]
#[tokio::test]
async fn sequences_increase_per_name(#[future] redis_context: Option<RedisContext>) {
    let Some(ctx) = redis_context.await else {
        return;
    };

    let first = ctx.store.next_sequence("transactions").await.expect("seq");
    let second = ctx.store.next_sequence("transactions").await.expect("seq");
    let other = ctx.store.next_sequence("other").await.expect("seq");

    assert_eq!((first, second, other), (1, 2, 1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_item_adds_are_never_lost(#[future] redis_context: Option<RedisContext>) {
    const CALLERS: u32 = 64;
    let Some(ctx) = redis_context.await else {
        return;
    };
    ctx.store
        .put(Table::Users, account_item("u1", Decimal::ZERO))
        .await
        .expect("put");

    let tasks = (0..CALLERS).map(|_| {
        let store = ctx.store.clone();
        tokio::spawn(async move { store.update(Table::Users, "u1", add(dec!(1))).await })
    });
    for outcome in join_all(tasks).await {
        outcome.expect("task joins").expect("add applies");
    }

    let wallet = ctx
        .store
        .get(Table::Users, "u1")
        .await
        .expect("get")
        .and_then(|item| item.get(WALLET).and_then(|value| value.as_n()));
    assert_eq!(wallet, Some(Decimal::from(CALLERS)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ledger_credits_are_never_lost(#[future] redis_context: Option<RedisContext>) {
    const CALLERS: u32 = 32;
    let Some(ctx) = redis_context.await else {
        return;
    };
    let services = fixture_services(Arc::new(ctx.store.clone()), 250);
    let user_id = UserId::new("u1").expect("valid user id");
    services
        .ledger
        .create_account(Account::new(user_id.clone(), "", Decimal::ZERO))
        .await
        .expect("account created");

    let tasks = (0..CALLERS).map(|_| {
        let ledger = services.ledger.clone();
        let user_id = user_id.clone();
        tokio::spawn(async move { ledger.adjust_balance(&user_id, dec!(1)).await })
    });
    for outcome in join_all(tasks).await {
        outcome.expect("task joins").expect("credit applies");
    }

    let account = services
        .ledger
        .get_account(&user_id)
        .await
        .expect("account exists");
    assert_eq!(account.wallet_amount, Decimal::from(CALLERS));
}
