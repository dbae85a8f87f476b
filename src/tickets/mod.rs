//! Support-ticket routing.
//!
//! Tickets move `pending -> open -> closed` and never back. Administrators
//! claim a ticket by opening it, which sets their [`AdminFocus`]; replies are
//! routed to the owner of the focused ticket. Users' messages are routed to
//! every administrator while they have an open ticket.
//!
//! Closing a ticket clears only the closing administrator's focus. Others
//! still focused on it keep a stale focus and can keep replying to the user.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SupportConfig;
use crate::error::{CoreError, Result};
use crate::ledger::Ledger;
use crate::model::{AccountId, NewTicket, Ticket, TicketId, TicketStatus, UserHandle};
use crate::notify::{self, Delivery, Notice, Notifier};
use crate::storage::TicketStore;

mod focus;
mod ids;

pub use focus::AdminFocus;
pub use ids::TicketIdGenerator;

/// A freshly created ticket and the announcements sent for it.
#[derive(Debug)]
pub struct Created {
    pub ticket: Ticket,
    pub notifications: Vec<Delivery>,
}

#[derive(Debug)]
pub struct Opened {
    pub ticket: Ticket,
    /// Platform identity of the ticket's owner, when it still resolves.
    pub owner: Option<UserHandle>,
    /// What the administrator was focused on before.
    pub previous_focus: Option<TicketId>,
    pub notification: Delivery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    pub ticket_id: TicketId,
    /// Whether the closing administrator's own focus was cleared.
    pub focus_cleared: bool,
}

/// A message handed to the notifier.
#[derive(Debug)]
pub struct Forwarded {
    pub ticket_id: TicketId,
    pub recipients: Vec<UserHandle>,
    pub delivery: Delivery,
}

pub struct TicketRouter {
    tickets: Arc<dyn TicketStore>,
    ledger: Ledger,
    notifier: Arc<dyn Notifier>,
    support: SupportConfig,
    focus: AdminFocus,
    ids: TicketIdGenerator,
}

impl TicketRouter {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        ledger: Ledger,
        notifier: Arc<dyn Notifier>,
        support: SupportConfig,
    ) -> Self {
        Self {
            tickets,
            ledger,
            notifier,
            support,
            focus: AdminFocus::new(),
            ids: TicketIdGenerator::new(),
        }
    }

    pub fn admins(&self) -> &[UserHandle] {
        &self.support.admins
    }

    pub fn is_admin(&self, handle: &UserHandle) -> bool {
        self.support.is_admin(handle)
    }

    pub fn focus(&self) -> &AdminFocus {
        &self.focus
    }

    pub async fn get(&self, id: &TicketId) -> Result<Ticket> {
        self.tickets
            .get(id)
            .await?
            .ok_or_else(|| CoreError::ticket_not_found(id))
    }

    /// Record a support request as a pending ticket.
    ///
    /// Only the store write can fail. The user and every administrator are
    /// told about the ticket best-effort.
    #[tracing::instrument(name = "tickets.create", skip_all, fields(account = %account_id))]
    pub async fn create_ticket(&self, account_id: AccountId, request: NewTicket) -> Result<Created> {
        let (id, created_at) = self.ids.next();
        let ticket = Ticket {
            id,
            account_id,
            subject: request.subject,
            category: request.category,
            priority: request.priority,
            description: request.description,
            status: TicketStatus::Pending,
            created_at,
        };
        self.tickets.create(&ticket).await?;
        info!(ticket = %ticket.id, priority = %ticket.priority, "Ticket created");

        let owner = match self.ledger.account(account_id).await {
            Ok(owner) => Some(owner.handle),
            Err(e) => {
                warn!(ticket = %ticket.id, error = %e, "Ticket owner not resolvable, skipping confirmation");
                None
            }
        };

        let mut notifications = Vec::with_capacity(2);
        if let Some(owner) = &owner {
            notifications.push(notify::dispatch_one(
                self.notifier.clone(),
                owner.clone(),
                Notice::TicketCreated {
                    ticket_id: ticket.id.clone(),
                    description: ticket.description.clone(),
                },
            ));
        }
        notifications.push(notify::dispatch(
            self.notifier.clone(),
            self.support.admins.clone(),
            Notice::NewTicket {
                ticket_id: ticket.id.clone(),
                user: owner.unwrap_or_else(|| UserHandle::new(account_id.to_string())),
                description: ticket.description.clone(),
            },
        ));

        Ok(Created {
            ticket,
            notifications,
        })
    }

    /// Claim a ticket: move it to `open` and focus `admin` on it.
    ///
    /// Opening an open ticket is a no-op on its status. A closed ticket is
    /// refused and the administrator's focus is left alone.
    #[tracing::instrument(name = "tickets.open", skip_all, fields(admin = %admin, ticket = %id))]
    pub async fn open_ticket(&self, admin: &UserHandle, id: &TicketId) -> Result<Opened> {
        let mut ticket = self.get(id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(CoreError::TicketClosed(id.clone()));
        }

        match self.tickets.advance_status(id, TicketStatus::Open).await? {
            Some(TicketStatus::Open) => ticket.status = TicketStatus::Open,
            Some(_) => return Err(CoreError::TicketClosed(id.clone())),
            None => return Err(CoreError::ticket_not_found(id)),
        }

        let previous_focus = self.focus.focus(admin, id.clone()).await;
        info!(previous = ?previous_focus, "Ticket opened");

        let owner = match self.ledger.account(ticket.account_id).await {
            Ok(account) => Some(account.handle),
            Err(e) => {
                warn!(error = %e, "Ticket owner not resolvable, skipping notice");
                None
            }
        };
        let notification = match &owner {
            Some(handle) => notify::dispatch_one(
                self.notifier.clone(),
                handle.clone(),
                Notice::TicketOpened {
                    ticket_id: id.clone(),
                },
            ),
            None => Delivery::none(),
        };

        Ok(Opened {
            ticket,
            owner,
            previous_focus,
            notification,
        })
    }

    /// Close a ticket for good.
    #[tracing::instrument(name = "tickets.close", skip_all, fields(admin = %admin, ticket = %id))]
    pub async fn close_ticket(&self, admin: &UserHandle, id: &TicketId) -> Result<Closed> {
        if self
            .tickets
            .advance_status(id, TicketStatus::Closed)
            .await?
            .is_none()
        {
            return Err(CoreError::ticket_not_found(id));
        }

        let focus_cleared = self.focus.clear_if(admin, id).await;
        info!(focus_cleared, "Ticket closed");
        Ok(Closed {
            ticket_id: id.clone(),
            focus_cleared,
        })
    }

    /// Send an administrator's reply to the owner of their focused ticket.
    #[tracing::instrument(name = "tickets.route_admin", skip_all, fields(admin = %admin))]
    pub async fn route_admin_message(&self, admin: &UserHandle, text: &str) -> Result<Forwarded> {
        let ticket_id = self
            .focus
            .current(admin)
            .await
            .ok_or_else(|| CoreError::NoFocus(admin.clone()))?;
        let ticket = self.get(&ticket_id).await?;
        let owner = self.ledger.account(ticket.account_id).await?;

        if ticket.status == TicketStatus::Closed {
            debug!(ticket = %ticket_id, "Replying on a closed ticket");
        }

        let recipients = vec![owner.handle];
        let delivery = notify::dispatch(
            self.notifier.clone(),
            recipients.clone(),
            Notice::SupportReply {
                ticket_id: ticket_id.clone(),
                text: text.to_string(),
            },
        );
        Ok(Forwarded {
            ticket_id,
            recipients,
            delivery,
        })
    }

    /// Fan a user's message out to every administrator.
    ///
    /// Only the user's most recent `open` ticket receives messages.
    #[tracing::instrument(name = "tickets.route_user", skip_all, fields(account = %account_id))]
    pub async fn route_user_message(&self, account_id: AccountId, text: &str) -> Result<Forwarded> {
        let ticket = self
            .tickets
            .latest_open_for(account_id)
            .await?
            .ok_or(CoreError::NoOpenTicket(account_id))?;
        let owner = self.ledger.account(account_id).await?;

        let recipients = self.support.admins.clone();
        debug!(ticket = %ticket.id, admins = recipients.len(), "Forwarding user message");
        let delivery = notify::dispatch(
            self.notifier.clone(),
            recipients.clone(),
            Notice::UserMessage {
                ticket_id: ticket.id.clone(),
                user: owner.handle,
                text: text.to_string(),
            },
        );
        Ok(Forwarded {
            ticket_id: ticket.id,
            recipients,
            delivery,
        })
    }
}
