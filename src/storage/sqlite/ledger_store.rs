//! SQLite LedgerStore implementation.

use async_trait::async_trait;
use chrono::Utc;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{begin_immediate, finish, format_timestamp, parse_timestamp};
use crate::model::{Account, AccountCounter, AccountId, TransferReceipt, UserHandle};
use crate::storage::schema::{Accounts, CREATE_ACCOUNTS_TABLE};
use crate::storage::{LedgerStore, Result, StorageError};

/// SQLite implementation of LedgerStore.
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Create a new SQLite ledger store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_ACCOUNTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    fn select_account() -> sea_query::SelectStatement {
        Query::select()
            .columns([
                Accounts::Id,
                Accounts::Handle,
                Accounts::Username,
                Accounts::Coins,
                Accounts::InviteCount,
                Accounts::ServersJoined,
                Accounts::CreatedAt,
            ])
            .from(Accounts::Table)
            .to_owned()
    }

    fn account_from_row(row: &SqliteRow) -> Result<Account> {
        let id: String = row.get("id");
        let handle: String = row.get("handle");
        let created_at: String = row.get("created_at");
        Ok(Account {
            id: AccountId::from(Uuid::parse_str(&id)?),
            handle: UserHandle::new(handle),
            username: row.get("username"),
            balance: row.get("coins"),
            invite_count: row.get("invite_count"),
            servers_joined: row.get("servers_joined"),
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn counter_column(counter: AccountCounter) -> Accounts {
        match counter {
            AccountCounter::Invites => Accounts::InviteCount,
            AccountCounter::ServersJoined => Accounts::ServersJoined,
        }
    }

    async fn balance_in_tx(conn: &mut SqliteConnection, id: AccountId) -> Result<i64> {
        let query = Query::select()
            .column(Accounts::Coins)
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&mut *conn).await?;
        match row {
            Some(row) => Ok(row.get("coins")),
            None => Err(StorageError::AccountNotFound(id)),
        }
    }

    async fn add_coins_in_tx(conn: &mut SqliteConnection, id: AccountId, delta: i64) -> Result<()> {
        let query = Query::update()
            .table(Accounts::Table)
            .value(Accounts::Coins, Expr::col(Accounts::Coins).add(delta))
            .and_where(Expr::col(Accounts::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&mut *conn).await?;
        Ok(())
    }

    async fn adjust_in_tx(conn: &mut SqliteConnection, id: AccountId, delta: i64) -> Result<i64> {
        let balance = Self::balance_in_tx(conn, id).await?;
        let updated = balance
            .checked_add(delta)
            .ok_or_else(|| StorageError::Corrupt(format!("balance overflow on account {id}")))?;
        if updated < 0 {
            return Err(StorageError::InsufficientFunds {
                balance,
                requested: -delta,
            });
        }
        Self::add_coins_in_tx(conn, id, delta).await?;
        Ok(updated)
    }

    async fn increment_in_tx(
        conn: &mut SqliteConnection,
        id: AccountId,
        counter: AccountCounter,
        by: i64,
    ) -> Result<i64> {
        let column = Self::counter_column(counter);
        let query = Query::update()
            .table(Accounts::Table)
            .value(Self::counter_column(counter), Expr::col(column).add(by))
            .and_where(Expr::col(Accounts::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let updated = sqlx::query(&query).execute(&mut *conn).await?;
        if updated.rows_affected() == 0 {
            return Err(StorageError::AccountNotFound(id));
        }

        let query = Query::select()
            .column(Self::counter_column(counter))
            .from(Accounts::Table)
            .and_where(Expr::col(Accounts::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);
        let row = sqlx::query(&query).fetch_one(&mut *conn).await?;
        Ok(row.get(0))
    }

    async fn transfer_in_tx(
        conn: &mut SqliteConnection,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<TransferReceipt> {
        let from_balance = Self::balance_in_tx(conn, from).await?;
        let to_balance = Self::balance_in_tx(conn, to).await?;

        if from_balance < amount {
            return Err(StorageError::InsufficientFunds {
                balance: from_balance,
                requested: amount,
            });
        }

        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| StorageError::Corrupt(format!("balance overflow on account {to}")))?;

        Self::add_coins_in_tx(conn, from, -amount).await?;
        Self::add_coins_in_tx(conn, to, amount).await?;

        Ok(TransferReceipt {
            from_balance: from_balance - amount,
            to_balance: credited,
        })
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn register(&self, handle: &UserHandle, username: &str) -> Result<Account> {
        let query = Query::insert()
            .into_table(Accounts::Table)
            .columns([
                Accounts::Id,
                Accounts::Handle,
                Accounts::Username,
                Accounts::Coins,
                Accounts::InviteCount,
                Accounts::ServersJoined,
                Accounts::CreatedAt,
            ])
            .values_panic([
                AccountId::new_v4().to_string().into(),
                handle.as_str().into(),
                username.into(),
                0i64.into(),
                0i64.into(),
                0i64.into(),
                format_timestamp(&Utc::now()).into(),
            ])
            .on_conflict(
                OnConflict::column(Accounts::Handle)
                    .update_column(Accounts::Username)
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;

        self.find_by_handle(handle)
            .await?
            .ok_or_else(|| StorageError::Corrupt(format!("account {handle} missing after upsert")))
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let query = Self::select_account()
            .and_where(Expr::col(Accounts::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::account_from_row).transpose()
    }

    async fn find_by_handle(&self, handle: &UserHandle) -> Result<Option<Account>> {
        let query = Self::select_account()
            .and_where(Expr::col(Accounts::Handle).eq(handle.as_str()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::account_from_row).transpose()
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = Self::adjust_in_tx(&mut conn, id, delta).await;
        finish(&mut conn, result).await
    }

    async fn increment(&self, id: AccountId, counter: AccountCounter, by: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = Self::increment_in_tx(&mut conn, id, counter, by).await;
        finish(&mut conn, result).await
    }

    async fn transfer(&self, from: AccountId, to: AccountId, amount: i64) -> Result<TransferReceipt> {
        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = Self::transfer_in_tx(&mut conn, from, to, amount).await;
        finish(&mut conn, result).await
    }
}
