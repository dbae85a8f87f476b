//! Core error taxonomy.
//!
//! Validation errors are raised before any store call. Store-evaluated
//! conditions (missing account, insufficient funds) keep their meaning;
//! every other storage failure surfaces as `Persistence`.

use crate::model::{AccountId, TicketId, UserHandle};
use crate::storage::StorageError;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: balance={balance}, requested={requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("Cannot transfer coins to the same account")]
    SelfTransfer,

    #[error("Administrator {0} has no focused ticket")]
    NoFocus(UserHandle),

    #[error("Account {0} has no open ticket")]
    NoOpenTicket(AccountId),

    #[error("Ticket {0} is closed")]
    TicketClosed(TicketId),

    #[error("Persistence error: {0}")]
    Persistence(StorageError),
}

impl CoreError {
    pub fn account_not_found(id: impl ToString) -> Self {
        CoreError::NotFound {
            kind: "account",
            id: id.to_string(),
        }
    }

    pub fn ticket_not_found(id: &TicketId) -> Self {
        CoreError::NotFound {
            kind: "ticket",
            id: id.to_string(),
        }
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::InvalidAmount(_) => "invalid_amount",
            CoreError::InsufficientFunds { .. } => "insufficient_funds",
            CoreError::SelfTransfer => "self_transfer",
            CoreError::NoFocus(_) => "no_focus",
            CoreError::NoOpenTicket(_) => "no_open_ticket",
            CoreError::TicketClosed(_) => "ticket_closed",
            CoreError::Persistence(_) => "persistence",
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AccountNotFound(id) => CoreError::account_not_found(id),
            StorageError::TicketNotFound(id) => CoreError::ticket_not_found(&id),
            StorageError::InsufficientFunds { balance, requested } => {
                CoreError::InsufficientFunds { balance, requested }
            }
            other => CoreError::Persistence(other),
        }
    }
}
