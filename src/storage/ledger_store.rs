//! LedgerStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::model::{Account, AccountCounter, AccountId, TransferReceipt, UserHandle};

/// Interface for durable account balances.
///
/// Every balance-checking mutation is evaluated inside the store's own
/// critical section (a conditional update or an immediate transaction), so
/// two concurrent debits of one account can never both pass the check.
///
/// # Implementations
///
/// - `SqliteLedgerStore`: SQLite storage
/// - `MockLedgerStore`: In-memory mock for testing
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the account for `handle`, or refresh its username if it exists.
    async fn register(&self, handle: &UserHandle, username: &str) -> Result<Account>;

    async fn get(&self, id: AccountId) -> Result<Option<Account>>;

    async fn find_by_handle(&self, handle: &UserHandle) -> Result<Option<Account>>;

    /// Add `delta` (which may be negative) to the balance and return the new balance.
    ///
    /// Fails with `InsufficientFunds` instead of producing a negative balance,
    /// and with `AccountNotFound` if the account does not exist.
    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<i64>;

    /// Increment one counter attribute and return its new value.
    async fn increment(&self, id: AccountId, counter: AccountCounter, by: i64) -> Result<i64>;

    /// Move `amount` coins from one account to another, all or nothing.
    ///
    /// The source balance is re-checked inside the same critical section
    /// that performs both updates.
    async fn transfer(&self, from: AccountId, to: AccountId, amount: i64) -> Result<TransferReceipt>;
}
