//! Which ticket each administrator is replying to.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::model::{TicketId, UserHandle};

/// Process-local map from administrator to focused ticket.
///
/// Guards are never held across an await outside this type.
#[derive(Debug, Default)]
pub struct AdminFocus {
    entries: RwLock<HashMap<UserHandle, TicketId>>,
}

impl AdminFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `admin` at `ticket`, returning the previous focus.
    pub async fn focus(&self, admin: &UserHandle, ticket: TicketId) -> Option<TicketId> {
        self.entries.write().await.insert(admin.clone(), ticket)
    }

    pub async fn current(&self, admin: &UserHandle) -> Option<TicketId> {
        self.entries.read().await.get(admin).cloned()
    }

    /// Clear `admin`'s focus only if it still points at `ticket`.
    pub async fn clear_if(&self, admin: &UserHandle, ticket: &TicketId) -> bool {
        let mut entries = self.entries.write().await;
        if entries.get(admin) == Some(ticket) {
            entries.remove(admin);
            true
        } else {
            false
        }
    }

    /// Administrators currently focused on `ticket`.
    pub async fn holders(&self, ticket: &TicketId) -> Vec<UserHandle> {
        let mut holders: Vec<UserHandle> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, focused)| *focused == ticket)
            .map(|(admin, _)| admin.clone())
            .collect();
        holders.sort();
        holders
    }
}
