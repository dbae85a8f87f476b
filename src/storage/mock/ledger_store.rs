//! Mock LedgerStore implementation for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::model::{Account, AccountCounter, AccountId, TransferReceipt, UserHandle};
use crate::storage::{LedgerStore, Result, StorageError};

/// Mock ledger store that keeps accounts in memory.
///
/// Every mutation runs under one write guard, which gives the same
/// all-or-nothing behaviour as the SQLite transactions.
#[derive(Default)]
pub struct MockLedgerStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    fail_on_read: RwLock<bool>,
    fail_on_balance: RwLock<bool>,
    fail_on_increment: RwLock<bool>,
}

impl MockLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Make `adjust_balance` and `transfer` fail.
    pub async fn set_fail_on_balance(&self, fail: bool) {
        *self.fail_on_balance.write().await = fail;
    }

    pub async fn set_fail_on_increment(&self, fail: bool) {
        *self.fail_on_increment.write().await = fail;
    }

    /// Register an account and give it an opening balance.
    pub async fn seed(&self, handle: &str, balance: i64) -> Account {
        let mut account = Account {
            id: AccountId::new_v4(),
            handle: UserHandle::new(handle),
            username: handle.to_string(),
            balance,
            invite_count: 0,
            servers_joined: 0,
            created_at: Utc::now(),
        };
        let mut accounts = self.accounts.write().await;
        if let Some(existing) = accounts.values_mut().find(|a| a.handle.as_str() == handle) {
            existing.balance = balance;
            account = existing.clone();
        } else {
            accounts.insert(account.id, account.clone());
        }
        account
    }

    /// Sum of all balances.
    pub async fn total_supply(&self) -> i64 {
        self.accounts.read().await.values().map(|a| a.balance).sum()
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Unavailable("mock read failure".to_string()));
        }
        Ok(())
    }

    async fn check_balance_writes(&self) -> Result<()> {
        if *self.fail_on_balance.read().await {
            return Err(StorageError::Unavailable("mock balance failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MockLedgerStore {
    async fn register(&self, handle: &UserHandle, username: &str) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        if let Some(existing) = accounts.values_mut().find(|a| &a.handle == handle) {
            existing.username = username.to_string();
            return Ok(existing.clone());
        }
        let account = Account {
            id: AccountId::new_v4(),
            handle: handle.clone(),
            username: username.to_string(),
            balance: 0,
            invite_count: 0,
            servers_joined: 0,
            created_at: Utc::now(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        self.check_read().await?;
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_handle(&self, handle: &UserHandle) -> Result<Option<Account>> {
        self.check_read().await?;
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| &a.handle == handle)
            .cloned())
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<i64> {
        self.check_balance_writes().await?;
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(StorageError::AccountNotFound(id))?;
        let updated = account.balance.checked_add(delta).ok_or_else(|| {
            StorageError::Corrupt(format!("balance overflow on account {id}"))
        })?;
        if updated < 0 {
            return Err(StorageError::InsufficientFunds {
                balance: account.balance,
                requested: -delta,
            });
        }
        account.balance = updated;
        Ok(updated)
    }

    async fn increment(&self, id: AccountId, counter: AccountCounter, by: i64) -> Result<i64> {
        if *self.fail_on_increment.read().await {
            return Err(StorageError::Unavailable("mock increment failure".to_string()));
        }
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(StorageError::AccountNotFound(id))?;
        let field = match counter {
            AccountCounter::Invites => &mut account.invite_count,
            AccountCounter::ServersJoined => &mut account.servers_joined,
        };
        *field += by;
        Ok(*field)
    }

    async fn transfer(&self, from: AccountId, to: AccountId, amount: i64) -> Result<TransferReceipt> {
        self.check_balance_writes().await?;
        let mut accounts = self.accounts.write().await;

        let from_balance = accounts
            .get(&from)
            .map(|a| a.balance)
            .ok_or(StorageError::AccountNotFound(from))?;
        let to_balance = accounts
            .get(&to)
            .map(|a| a.balance)
            .ok_or(StorageError::AccountNotFound(to))?;
        if from_balance < amount {
            return Err(StorageError::InsufficientFunds {
                balance: from_balance,
                requested: amount,
            });
        }
        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| StorageError::Corrupt(format!("balance overflow on account {to}")))?;

        let mut receipt = TransferReceipt {
            from_balance: from_balance - amount,
            to_balance: credited,
        };
        if let Some(source) = accounts.get_mut(&from) {
            source.balance -= amount;
            receipt.from_balance = source.balance;
        }
        if let Some(destination) = accounts.get_mut(&to) {
            destination.balance += amount;
            receipt.to_balance = destination.balance;
        }
        Ok(receipt)
    }
}
