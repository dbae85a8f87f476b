//! SQLite TicketStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{begin_immediate, finish, format_timestamp, parse_timestamp};
use crate::model::{AccountId, Ticket, TicketId, TicketPriority, TicketStatus};
use crate::storage::schema::{SupportTickets, CREATE_SUPPORT_TICKETS_TABLE};
use crate::storage::{Result, StorageError, TicketStore};

/// SQLite implementation of TicketStore.
pub struct SqliteTicketStore {
    pool: SqlitePool,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    ///
    /// Tickets reference accounts, so the ledger schema must exist first.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_SUPPORT_TICKETS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn select_ticket() -> sea_query::SelectStatement {
        Query::select()
            .columns([
                SupportTickets::TicketId,
                SupportTickets::AccountId,
                SupportTickets::Subject,
                SupportTickets::Category,
                SupportTickets::Priority,
                SupportTickets::Description,
                SupportTickets::Status,
                SupportTickets::CreatedAt,
            ])
            .from(SupportTickets::Table)
            .to_owned()
    }

    fn ticket_from_row(row: &SqliteRow) -> Result<Ticket> {
        let id: String = row.get("ticket_id");
        let account_id: String = row.get("account_id");
        let priority: String = row.get("priority");
        let status: String = row.get("status");
        let created_at: String = row.get("created_at");

        Ok(Ticket {
            id: TicketId::new(id),
            account_id: AccountId::from(Uuid::parse_str(&account_id)?),
            subject: row.get("subject"),
            category: row.get("category"),
            priority: priority.parse::<TicketPriority>().map_err(StorageError::Corrupt)?,
            description: row.get("description"),
            status: status.parse::<TicketStatus>().map_err(StorageError::Corrupt)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    async fn advance_in_tx(
        conn: &mut SqliteConnection,
        id: &TicketId,
        next: TicketStatus,
    ) -> Result<Option<TicketStatus>> {
        let query = Query::select()
            .column(SupportTickets::Status)
            .from(SupportTickets::Table)
            .and_where(Expr::col(SupportTickets::TicketId).eq(id.as_str()))
            .to_string(SqliteQueryBuilder);

        let Some(row) = sqlx::query(&query).fetch_optional(&mut *conn).await? else {
            return Ok(None);
        };
        let raw: String = row.get("status");
        let current = raw.parse::<TicketStatus>().map_err(StorageError::Corrupt)?;

        if current == next || !current.can_advance_to(next) {
            return Ok(Some(current));
        }

        let query = Query::update()
            .table(SupportTickets::Table)
            .value(SupportTickets::Status, next.as_str())
            .and_where(Expr::col(SupportTickets::TicketId).eq(id.as_str()))
            .to_string(SqliteQueryBuilder);
        sqlx::query(&query).execute(&mut *conn).await?;

        Ok(Some(next))
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn create(&self, ticket: &Ticket) -> Result<()> {
        let query = Query::insert()
            .into_table(SupportTickets::Table)
            .columns([
                SupportTickets::TicketId,
                SupportTickets::AccountId,
                SupportTickets::Subject,
                SupportTickets::Category,
                SupportTickets::Priority,
                SupportTickets::Description,
                SupportTickets::Status,
                SupportTickets::CreatedAt,
            ])
            .values_panic([
                ticket.id.as_str().into(),
                ticket.account_id.to_string().into(),
                ticket.subject.as_str().into(),
                ticket.category.as_str().into(),
                ticket.priority.as_str().into(),
                ticket.description.as_str().into(),
                ticket.status.as_str().into(),
                format_timestamp(&ticket.created_at).into(),
            ])
            .to_string(SqliteQueryBuilder);

        sqlx::query(&query).execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, id: &TicketId) -> Result<Option<Ticket>> {
        let query = Self::select_ticket()
            .and_where(Expr::col(SupportTickets::TicketId).eq(id.as_str()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::ticket_from_row).transpose()
    }

    async fn advance_status(&self, id: &TicketId, next: TicketStatus) -> Result<Option<TicketStatus>> {
        let mut conn = self.pool.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = Self::advance_in_tx(&mut conn, id, next).await;
        finish(&mut conn, result).await
    }

    async fn latest_open_for(&self, account: AccountId) -> Result<Option<Ticket>> {
        let query = Self::select_ticket()
            .and_where(Expr::col(SupportTickets::AccountId).eq(account.to_string()))
            .and_where(Expr::col(SupportTickets::Status).eq(TicketStatus::Open.as_str()))
            .order_by(SupportTickets::CreatedAt, Order::Desc)
            .order_by(SupportTickets::TicketId, Order::Desc)
            .limit(1)
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::ticket_from_row).transpose()
    }
}
