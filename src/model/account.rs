//! Ledger accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, UserHandle};

/// A coin ledger account. Owned by the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub handle: UserHandle,
    pub username: String,
    pub balance: i64,
    pub invite_count: i64,
    pub servers_joined: i64,
    pub created_at: DateTime<Utc>,
}

/// Account attributes that bonuses increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCounter {
    Invites,
    ServersJoined,
}

impl AccountCounter {
    /// Read the counter's current value from an account.
    pub fn read(&self, account: &Account) -> i64 {
        match self {
            AccountCounter::Invites => account.invite_count,
            AccountCounter::ServersJoined => account.servers_joined,
        }
    }
}

/// Balances of both sides after a committed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from_balance: i64,
    pub to_balance: i64,
}
