//! SQLite implementations of storage interfaces.
//!
//! Check-then-mutate sequences run inside `BEGIN IMMEDIATE` transactions.
//! SQLite takes the database write lock at `BEGIN`, so concurrent writers on
//! other pooled connections queue behind the busy timeout instead of racing.

mod ledger_store;
mod ticket_store;

pub use ledger_store::SqliteLedgerStore;
pub use ticket_store::SqliteTicketStore;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqliteConnection;

use super::Result;

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

pub(crate) async fn begin_immediate(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(())
}

/// Commit on success, roll back on failure, and pass the result through.
pub(crate) async fn finish<T>(conn: &mut SqliteConnection, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(value)
        }
        Err(e) => {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            Err(e)
        }
    }
}
