//! LedgerStore interface tests.
//!
//! These tests verify the contract of the LedgerStore trait.
//! Each storage implementation should run these tests against one shared
//! store, so every test uses its own handles.

use futures::future::join_all;

use guildkeep::model::{AccountCounter, AccountId, UserHandle};
use guildkeep::storage::{LedgerStore, StorageError};

async fn funded<S: LedgerStore + ?Sized>(store: &S, handle: &str, balance: i64) -> AccountId {
    let account = store
        .register(&UserHandle::new(handle), handle)
        .await
        .expect("register should succeed");
    if balance > 0 {
        store
            .adjust_balance(account.id, balance)
            .await
            .expect("funding should succeed");
    }
    account.id
}

async fn balance_of<S: LedgerStore + ?Sized>(store: &S, id: AccountId) -> i64 {
    store
        .get(id)
        .await
        .expect("get should succeed")
        .expect("account should exist")
        .balance
}

// =============================================================================
// register / lookup tests
// =============================================================================

pub async fn test_register_creates_empty_account<S: LedgerStore + ?Sized>(store: &S) {
    let handle = UserHandle::new("ledger_register_new");
    let account = store.register(&handle, "New User").await.unwrap();

    assert_eq!(account.handle, handle);
    assert_eq!(account.username, "New User");
    assert_eq!(account.balance, 0);
    assert_eq!(account.invite_count, 0);
    assert_eq!(account.servers_joined, 0);

    let found = store.find_by_handle(&handle).await.unwrap().unwrap();
    assert_eq!(found.id, account.id);
}

pub async fn test_register_again_keeps_identity_and_balance<S: LedgerStore + ?Sized>(store: &S) {
    let id = funded(store, "ledger_register_again", 7).await;

    let again = store
        .register(&UserHandle::new("ledger_register_again"), "Renamed")
        .await
        .unwrap();

    assert_eq!(again.id, id);
    assert_eq!(again.balance, 7);
    assert_eq!(again.username, "Renamed");
}

pub async fn test_lookup_missing<S: LedgerStore + ?Sized>(store: &S) {
    assert!(store.get(AccountId::new_v4()).await.unwrap().is_none());
    assert!(store
        .find_by_handle(&UserHandle::new("ledger_nobody"))
        .await
        .unwrap()
        .is_none());
}

// =============================================================================
// adjust_balance tests
// =============================================================================

pub async fn test_credit_and_debit<S: LedgerStore + ?Sized>(store: &S) {
    let id = funded(store, "ledger_credit_debit", 0).await;

    assert_eq!(store.adjust_balance(id, 10).await.unwrap(), 10);
    assert_eq!(store.adjust_balance(id, -4).await.unwrap(), 6);
    assert_eq!(store.adjust_balance(id, -6).await.unwrap(), 0);
    assert_eq!(balance_of(store, id).await, 0);
}

pub async fn test_debit_below_zero_is_refused<S: LedgerStore + ?Sized>(store: &S) {
    let id = funded(store, "ledger_overdraw", 5).await;

    let result = store.adjust_balance(id, -6).await;

    assert!(matches!(
        result,
        Err(StorageError::InsufficientFunds {
            balance: 5,
            requested: 6
        })
    ));
    assert_eq!(balance_of(store, id).await, 5);
}

pub async fn test_adjust_missing_account<S: LedgerStore + ?Sized>(store: &S) {
    let missing = AccountId::new_v4();
    let result = store.adjust_balance(missing, 1).await;
    assert!(matches!(result, Err(StorageError::AccountNotFound(id)) if id == missing));
}

// =============================================================================
// increment tests
// =============================================================================

pub async fn test_counters_are_independent<S: LedgerStore + ?Sized>(store: &S) {
    let id = funded(store, "ledger_counters", 3).await;

    assert_eq!(store.increment(id, AccountCounter::Invites, 1).await.unwrap(), 1);
    assert_eq!(store.increment(id, AccountCounter::Invites, 2).await.unwrap(), 3);
    assert_eq!(
        store
            .increment(id, AccountCounter::ServersJoined, 1)
            .await
            .unwrap(),
        1
    );

    let account = store.get(id).await.unwrap().unwrap();
    assert_eq!(account.invite_count, 3);
    assert_eq!(account.servers_joined, 1);
    assert_eq!(account.balance, 3, "counters never touch the balance");
}

pub async fn test_increment_missing_account<S: LedgerStore + ?Sized>(store: &S) {
    let result = store
        .increment(AccountId::new_v4(), AccountCounter::Invites, 1)
        .await;
    assert!(matches!(result, Err(StorageError::AccountNotFound(_))));
}

// =============================================================================
// transfer tests
// =============================================================================

pub async fn test_transfer_conserves_supply<S: LedgerStore + ?Sized>(store: &S) {
    let a = funded(store, "ledger_transfer_a", 10).await;
    let b = funded(store, "ledger_transfer_b", 4).await;

    let receipt = store.transfer(a, b, 6).await.unwrap();

    assert_eq!(receipt.from_balance, 4);
    assert_eq!(receipt.to_balance, 10);
    assert_eq!(balance_of(store, a).await + balance_of(store, b).await, 14);
}

pub async fn test_transfer_entire_balance<S: LedgerStore + ?Sized>(store: &S) {
    let a = funded(store, "ledger_transfer_all_a", 5).await;
    let b = funded(store, "ledger_transfer_all_b", 0).await;

    let receipt = store.transfer(a, b, 5).await.unwrap();

    assert_eq!(receipt.from_balance, 0);
    assert_eq!(receipt.to_balance, 5);
}

pub async fn test_transfer_insufficient_changes_nothing<S: LedgerStore + ?Sized>(store: &S) {
    let a = funded(store, "ledger_transfer_poor_a", 3).await;
    let b = funded(store, "ledger_transfer_poor_b", 1).await;

    let result = store.transfer(a, b, 4).await;

    assert!(matches!(
        result,
        Err(StorageError::InsufficientFunds {
            balance: 3,
            requested: 4
        })
    ));
    assert_eq!(balance_of(store, a).await, 3);
    assert_eq!(balance_of(store, b).await, 1);
}

pub async fn test_transfer_to_missing_account<S: LedgerStore + ?Sized>(store: &S) {
    let a = funded(store, "ledger_transfer_orphan", 8).await;
    let missing = AccountId::new_v4();

    let result = store.transfer(a, missing, 2).await;

    assert!(matches!(result, Err(StorageError::AccountNotFound(id)) if id == missing));
    assert_eq!(balance_of(store, a).await, 8);
}

pub async fn test_transfer_from_missing_account<S: LedgerStore + ?Sized>(store: &S) {
    let b = funded(store, "ledger_transfer_from_ghost", 0).await;
    let result = store.transfer(AccountId::new_v4(), b, 1).await;
    assert!(matches!(result, Err(StorageError::AccountNotFound(_))));
    assert_eq!(balance_of(store, b).await, 0);
}

/// Ten concurrent transfers of 3 from a balance of 10: exactly three succeed.
pub async fn test_concurrent_transfers_never_overdraw<S: LedgerStore + ?Sized>(store: &S) {
    let source = funded(store, "ledger_race_source", 10).await;
    let mut sinks = Vec::new();
    for i in 0..10 {
        sinks.push(funded(store, &format!("ledger_race_sink_{i}"), 0).await);
    }

    let results = join_all(sinks.iter().map(|sink| store.transfer(source, *sink, 3))).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, StorageError::InsufficientFunds { .. })));
    assert_eq!(balance_of(store, source).await, 1);

    let mut received = 0;
    for sink in &sinks {
        received += balance_of(store, *sink).await;
    }
    assert_eq!(received, 9);
}

/// A transfer that would overflow the destination fails cleanly and leaves
/// the store writable.
pub async fn test_transfer_into_saturated_account<S: LedgerStore + ?Sized>(store: &S) {
    let a = funded(store, "ledger_saturated_source", i64::MAX).await;
    let b = funded(store, "ledger_saturated_sink", i64::MAX).await;
    let c = funded(store, "ledger_saturated_bystander", 0).await;

    let result = store.transfer(a, b, 1).await;

    assert!(matches!(result, Err(StorageError::Corrupt(_))));
    assert_eq!(balance_of(store, a).await, i64::MAX);
    assert_eq!(balance_of(store, b).await, i64::MAX);

    let overflow = store.adjust_balance(b, 1).await;
    assert!(matches!(overflow, Err(StorageError::Corrupt(_))));

    assert_eq!(store.adjust_balance(c, 5).await.unwrap(), 5);
    let receipt = store.transfer(a, c, 5).await.unwrap();
    assert_eq!(receipt.from_balance, i64::MAX - 5);
    assert_eq!(receipt.to_balance, 10);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all LedgerStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_ledger_store_tests {
    ($store:expr) => {
        use $crate::storage::ledger_store_tests::*;

        test_register_creates_empty_account($store).await;
        println!("  test_register_creates_empty_account: PASSED");

        test_register_again_keeps_identity_and_balance($store).await;
        println!("  test_register_again_keeps_identity_and_balance: PASSED");

        test_lookup_missing($store).await;
        println!("  test_lookup_missing: PASSED");

        test_credit_and_debit($store).await;
        println!("  test_credit_and_debit: PASSED");

        test_debit_below_zero_is_refused($store).await;
        println!("  test_debit_below_zero_is_refused: PASSED");

        test_adjust_missing_account($store).await;
        println!("  test_adjust_missing_account: PASSED");

        test_counters_are_independent($store).await;
        println!("  test_counters_are_independent: PASSED");

        test_increment_missing_account($store).await;
        println!("  test_increment_missing_account: PASSED");

        test_transfer_conserves_supply($store).await;
        println!("  test_transfer_conserves_supply: PASSED");

        test_transfer_entire_balance($store).await;
        println!("  test_transfer_entire_balance: PASSED");

        test_transfer_insufficient_changes_nothing($store).await;
        println!("  test_transfer_insufficient_changes_nothing: PASSED");

        test_transfer_to_missing_account($store).await;
        println!("  test_transfer_to_missing_account: PASSED");

        test_transfer_from_missing_account($store).await;
        println!("  test_transfer_from_missing_account: PASSED");

        test_concurrent_transfers_never_overdraw($store).await;
        println!("  test_concurrent_transfers_never_overdraw: PASSED");

        test_transfer_into_saturated_account($store).await;
        println!("  test_transfer_into_saturated_account: PASSED");
    };
}
