//! Mock TicketStore implementation for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{AccountId, Ticket, TicketId, TicketStatus};
use crate::storage::{Result, StorageError, TicketStore};

/// Mock ticket store that keeps tickets in memory, in creation order.
#[derive(Default)]
pub struct MockTicketStore {
    tickets: RwLock<Vec<Ticket>>,
    fail_on_create: RwLock<bool>,
    fail_on_get: RwLock<bool>,
}

impl MockTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_create(&self, fail: bool) {
        *self.fail_on_create.write().await = fail;
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[async_trait]
impl TicketStore for MockTicketStore {
    async fn create(&self, ticket: &Ticket) -> Result<()> {
        if *self.fail_on_create.read().await {
            return Err(StorageError::Unavailable("mock create failure".to_string()));
        }
        let mut tickets = self.tickets.write().await;
        if tickets.iter().any(|t| t.id == ticket.id) {
            return Err(StorageError::Corrupt(format!("duplicate ticket {}", ticket.id)));
        }
        tickets.push(ticket.clone());
        Ok(())
    }

    async fn get(&self, id: &TicketId) -> Result<Option<Ticket>> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Unavailable("mock get failure".to_string()));
        }
        Ok(self.tickets.read().await.iter().find(|t| &t.id == id).cloned())
    }

    async fn advance_status(&self, id: &TicketId, next: TicketStatus) -> Result<Option<TicketStatus>> {
        let mut tickets = self.tickets.write().await;
        let Some(ticket) = tickets.iter_mut().find(|t| &t.id == id) else {
            return Ok(None);
        };
        if ticket.status.can_advance_to(next) {
            ticket.status = next;
        }
        Ok(Some(ticket.status))
    }

    async fn latest_open_for(&self, account: AccountId) -> Result<Option<Ticket>> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Unavailable("mock get failure".to_string()));
        }
        Ok(self
            .tickets
            .read()
            .await
            .iter()
            .filter(|t| t.account_id == account && t.status == TicketStatus::Open)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }
}
