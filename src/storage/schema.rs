//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Accounts table schema.
#[derive(Iden)]
pub enum Accounts {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "handle"]
    Handle,
    #[iden = "username"]
    Username,
    #[iden = "coins"]
    Coins,
    #[iden = "invite_count"]
    InviteCount,
    #[iden = "servers_joined"]
    ServersJoined,
    #[iden = "created_at"]
    CreatedAt,
}

/// Support tickets table schema.
#[derive(Iden)]
pub enum SupportTickets {
    #[iden = "support_tickets"]
    Table,
    #[iden = "ticket_id"]
    TicketId,
    #[iden = "account_id"]
    AccountId,
    #[iden = "subject"]
    Subject,
    #[iden = "category"]
    Category,
    #[iden = "priority"]
    Priority,
    #[iden = "description"]
    Description,
    #[iden = "status"]
    Status,
    #[iden = "created_at"]
    CreatedAt,
}

/// SQL for creating the accounts table.
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY NOT NULL,
    handle TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL,
    coins INTEGER NOT NULL DEFAULT 0 CHECK (coins >= 0),
    invite_count INTEGER NOT NULL DEFAULT 0,
    servers_joined INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
"#;

/// SQL for creating the support tickets table.
pub const CREATE_SUPPORT_TICKETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS support_tickets (
    ticket_id TEXT PRIMARY KEY NOT NULL,
    account_id TEXT NOT NULL REFERENCES accounts(id),
    subject TEXT NOT NULL,
    category TEXT NOT NULL,
    priority TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_support_tickets_account_status
    ON support_tickets(account_id, status, created_at);
"#;
