//! TicketStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::model::{AccountId, Ticket, TicketId, TicketStatus};

/// Interface for durable support tickets.
///
/// # Implementations
///
/// - `SqliteTicketStore`: SQLite storage
/// - `MockTicketStore`: In-memory mock for testing
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, ticket: &Ticket) -> Result<()>;

    async fn get(&self, id: &TicketId) -> Result<Option<Ticket>>;

    /// Move a ticket forward to `next`.
    ///
    /// The stored status is only replaced when `current.can_advance_to(next)`,
    /// so a closed ticket stays closed. Returns the status the ticket has after
    /// the call, or `None` if no such ticket exists.
    async fn advance_status(&self, id: &TicketId, next: TicketStatus) -> Result<Option<TicketStatus>>;

    /// The most recently created ticket of `account` whose status is `Open`.
    async fn latest_open_for(&self, account: AccountId) -> Result<Option<Ticket>>;
}
