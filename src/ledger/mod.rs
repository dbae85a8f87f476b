//! Coin ledger operations.
//!
//! Thin validation layer over [`LedgerStore`]. Amount and self-transfer
//! checks happen here, before any store call; balance checks happen inside
//! the store, where they are serialized with the mutation.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::model::{Account, AccountCounter, AccountId, TransferReceipt, UserHandle};
use crate::storage::LedgerStore;

/// Which half of a bonus failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusStage {
    Credit,
    Counter,
}

impl fmt::Display for BonusStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BonusStage::Credit => f.write_str("credit"),
            BonusStage::Counter => f.write_str("counter"),
        }
    }
}

/// Balance and counter after a bonus was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BonusReceipt {
    pub balance: i64,
    pub count: i64,
}

/// A bonus that did not fully apply.
///
/// A `Counter` failure means the coins were credited but the counter was not.
#[derive(Debug, thiserror::Error)]
#[error("bonus {stage} failed: {error}")]
pub struct BonusFailure {
    pub stage: BonusStage,
    pub error: CoreError,
}

/// Reject non-positive amounts.
pub fn validate_amount(amount: i64) -> Result<i64> {
    if amount < 1 {
        return Err(CoreError::InvalidAmount(amount.to_string()));
    }
    Ok(amount)
}

/// Parse a user-supplied amount.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let amount = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| CoreError::InvalidAmount(raw.trim().to_string()))?;
    validate_amount(amount)
}

/// Coin ledger service.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create or refresh the account for a platform identity.
    pub async fn register(&self, handle: &UserHandle, username: &str) -> Result<Account> {
        let account = self.store.register(handle, username).await?;
        info!(account = %account.id, handle = %handle, "Account registered");
        Ok(account)
    }

    pub async fn account(&self, id: AccountId) -> Result<Account> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CoreError::account_not_found(id))
    }

    /// Resolve a platform identity to its account, if it has one.
    pub async fn find(&self, handle: &UserHandle) -> Result<Option<Account>> {
        Ok(self.store.find_by_handle(handle).await?)
    }

    /// Resolve a platform identity that must have an account.
    pub async fn require(&self, handle: &UserHandle) -> Result<Account> {
        self.find(handle)
            .await?
            .ok_or_else(|| CoreError::account_not_found(handle))
    }

    pub async fn balance(&self, id: AccountId) -> Result<i64> {
        Ok(self.account(id).await?.balance)
    }

    #[tracing::instrument(name = "ledger.credit", skip(self))]
    pub async fn credit(&self, id: AccountId, amount: i64) -> Result<i64> {
        let amount = validate_amount(amount)?;
        let balance = self.store.adjust_balance(id, amount).await?;
        debug!(balance, "Credited");
        Ok(balance)
    }

    #[tracing::instrument(name = "ledger.debit", skip(self))]
    pub async fn debit(&self, id: AccountId, amount: i64) -> Result<i64> {
        let amount = validate_amount(amount)?;
        let balance = self.store.adjust_balance(id, -amount).await?;
        debug!(balance, "Debited");
        Ok(balance)
    }

    /// Move coins between two accounts atomically.
    #[tracing::instrument(name = "ledger.transfer", skip(self))]
    pub async fn transfer(&self, from: AccountId, to: AccountId, amount: i64) -> Result<TransferReceipt> {
        if from == to {
            return Err(CoreError::SelfTransfer);
        }
        let amount = validate_amount(amount)?;
        let receipt = self.store.transfer(from, to, amount).await?;
        info!(
            from_balance = receipt.from_balance,
            to_balance = receipt.to_balance,
            "Transfer committed"
        );
        Ok(receipt)
    }

    /// Apply a bonus: credit `amount`, then bump `counter` by one.
    ///
    /// The two writes are not atomic with each other; the failure says which
    /// one did not happen.
    #[tracing::instrument(name = "ledger.award", skip(self))]
    pub async fn award(
        &self,
        id: AccountId,
        amount: i64,
        counter: AccountCounter,
    ) -> std::result::Result<BonusReceipt, BonusFailure> {
        let balance = self.credit(id, amount).await.map_err(|error| BonusFailure {
            stage: BonusStage::Credit,
            error,
        })?;
        let count = self
            .store
            .increment(id, counter, 1)
            .await
            .map_err(|error| BonusFailure {
                stage: BonusStage::Counter,
                error: error.into(),
            })?;
        Ok(BonusReceipt { balance, count })
    }
}
