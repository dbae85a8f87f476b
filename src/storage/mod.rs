//! Storage implementations.
//!
//! The ledger and ticket stores are the only durable state. Everything that
//! needs check-then-mutate atomicity (transfers, conditional debits, ticket
//! status advances) happens inside the store, never in the caller.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::model::{AccountId, TicketId};

mod ledger_store;
pub mod mock;
pub mod schema;
pub mod sqlite;
mod ticket_store;

pub use ledger_store::LedgerStore;
pub use sqlite::{SqliteLedgerStore, SqliteTicketStore};
pub use ticket_store::TicketStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    #[error("Insufficient funds: balance={balance}, requested={requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize storage based on configuration.
///
/// Returns tuple of (LedgerStore, TicketStore) sharing one connection pool.
pub async fn init_storage(
    config: &StorageConfig,
) -> Result<(Arc<dyn LedgerStore>, Arc<dyn TicketStore>)> {
    info!(storage_type = ?config.storage_type, path = %config.path, "Initializing storage");

    match config.storage_type {
        StorageType::Sqlite => {
            let in_memory = config.path == ":memory:";
            let url = if in_memory {
                "sqlite::memory:".to_string()
            } else {
                if let Some(parent) = std::path::Path::new(&config.path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
                format!("sqlite:{}", config.path)
            };

            let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

            // Every pooled connection to `:memory:` is a separate database.
            let max_connections = if in_memory { 1 } else { config.max_connections };

            let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
            if in_memory {
                // Dropping the only connection drops the database.
                pool_options = pool_options.idle_timeout(None).max_lifetime(None);
            }
            let pool = pool_options.connect_with(options).await?;

            let ledger = Arc::new(SqliteLedgerStore::new(pool.clone()));
            ledger.init().await?;

            let tickets = Arc::new(SqliteTicketStore::new(pool));
            tickets.init().await?;

            Ok((ledger, tickets))
        }
    }
}
