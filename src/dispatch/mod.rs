//! Event and command entry points.
//!
//! Every call returns a [`Reply`]; errors never escape as `Err`. Platform
//! presentation of a reply (embeds, reactions) is the platform client's job.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::invites::{BonusOutcome, InviteTracker, JoinOutcome};
use crate::ledger::{self, BonusStage, Ledger};
use crate::model::{AccountId, CommunityId, NewTicket, TicketId, TicketPriority, UserHandle};
use crate::notify::{self, Notice, Notifier};
use crate::platform::{Invite, InviteSource, PlatformError};
use crate::storage::{LedgerStore, TicketStore};
use crate::tickets::TicketRouter;

mod commands;
mod console;

pub use commands::{AdminCommand, CommandError};
pub use console::{Amount, Console, Envelope};

/// Serialisable view of a [`BonusOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BonusStatus {
    NotEligible,
    Credited { balance: i64, count: i64 },
    PartialFailure { stage: BonusStage, error: String },
}

impl From<&BonusOutcome> for BonusStatus {
    fn from(outcome: &BonusOutcome) -> Self {
        match outcome {
            BonusOutcome::NotEligible => BonusStatus::NotEligible,
            BonusOutcome::Credited(receipt) => BonusStatus::Credited {
                balance: receipt.balance,
                count: receipt.count,
            },
            BonusOutcome::PartialFailure(failure) => BonusStatus::PartialFailure {
                stage: failure.stage,
                error: failure.error.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Joined {
        invite: Option<String>,
        inviter: Option<UserHandle>,
        inviter_bonus: BonusStatus,
        welcome_bonus: BonusStatus,
    },
    Seeded {
        communities: usize,
    },
    Acknowledged,
    /// Not a command; nothing was done.
    Ignored,
    /// The author has no ledger account yet.
    NeedsAccount,
    Usage {
        message: String,
    },
    Registered {
        account_id: AccountId,
        balance: i64,
    },
    Balance {
        user: UserHandle,
        balance: i64,
        invites: i64,
        servers_joined: i64,
    },
    GiftSent {
        to: UserHandle,
        amount: i64,
        balance: i64,
    },
    TicketCreated {
        ticket_id: TicketId,
    },
    /// Everything an administrator needs to start working the ticket.
    TicketOpened {
        ticket_id: TicketId,
        owner: Option<UserHandle>,
        subject: String,
        category: String,
        priority: TicketPriority,
        description: String,
        previous_focus: Option<TicketId>,
    },
    TicketClosed {
        ticket_id: TicketId,
    },
    Forwarded {
        ticket_id: TicketId,
        recipients: usize,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl Reply {
    pub fn error_kind(&self) -> Option<&str> {
        match self {
            Reply::Error { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl From<JoinOutcome> for Reply {
    fn from(outcome: JoinOutcome) -> Self {
        Reply::Joined {
            inviter: outcome.invite.as_ref().and_then(|i| i.inviter.clone()),
            invite: outcome.invite.map(|i| i.code),
            inviter_bonus: BonusStatus::from(&outcome.inviter_bonus),
            welcome_bonus: BonusStatus::from(&outcome.welcome_bonus),
        }
    }
}

fn core_failure(error: CoreError) -> Reply {
    match &error {
        CoreError::Persistence(_) => warn!(kind = error.kind(), error = %error, "Request failed"),
        _ => debug!(kind = error.kind(), error = %error, "Request rejected"),
    }
    Reply::Error {
        kind: error.kind().to_string(),
        message: error.to_string(),
    }
}

fn platform_failure(error: PlatformError) -> Reply {
    warn!(error = %error, "Platform request failed");
    Reply::Error {
        kind: "platform".to_string(),
        message: error.to_string(),
    }
}

/// Routes platform events and user commands into the ledger, invite
/// tracker and ticket router.
pub struct Dispatcher {
    ledger: Ledger,
    invites: InviteTracker,
    tickets: TicketRouter,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(
        config: &Config,
        ledger_store: Arc<dyn LedgerStore>,
        ticket_store: Arc<dyn TicketStore>,
        invite_source: Arc<dyn InviteSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let ledger = Ledger::new(ledger_store);
        let invites = InviteTracker::new(
            invite_source,
            ledger.clone(),
            notifier.clone(),
            config.rewards.clone(),
        );
        let tickets = TicketRouter::new(
            ticket_store,
            ledger.clone(),
            notifier.clone(),
            config.support.clone(),
        );
        Self {
            ledger,
            invites,
            tickets,
            notifier,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn invites(&self) -> &InviteTracker {
        &self.invites
    }

    pub fn tickets(&self) -> &TicketRouter {
        &self.tickets
    }

    // ---- platform events ----

    /// Snapshot every community at startup.
    pub async fn on_ready(&self) -> Reply {
        match self.invites.seed_all().await {
            Ok(communities) => Reply::Seeded { communities },
            Err(e) => platform_failure(e),
        }
    }

    pub async fn on_join(&self, community: &CommunityId, member: &UserHandle) -> Reply {
        self.invites.on_join(community, member).await.into()
    }

    pub async fn on_community_added(&self, community: &CommunityId) -> Reply {
        match self.invites.on_community_added(community).await {
            Ok(()) => Reply::Seeded { communities: 1 },
            Err(e) => platform_failure(e),
        }
    }

    pub async fn on_invite_created(&self, community: &CommunityId, invite: &Invite) -> Reply {
        self.invites.on_invite_created(community, invite).await;
        Reply::Acknowledged
    }

    pub async fn on_invite_deleted(&self, community: &CommunityId, code: &str) -> Reply {
        self.invites.on_invite_deleted(community, code).await;
        Reply::Acknowledged
    }

    /// Route a direct message by whether its author is an administrator.
    pub async fn on_direct_message(&self, author: &UserHandle, text: &str) -> Reply {
        if self.tickets.is_admin(author) {
            self.on_admin_direct_message(author, text).await
        } else {
            self.on_user_direct_message(author, text).await
        }
    }

    pub async fn on_admin_direct_message(&self, admin: &UserHandle, text: &str) -> Reply {
        let command = match AdminCommand::parse(text) {
            Ok(Some(command)) => command,
            Ok(None) => return Reply::Ignored,
            Err(e) => {
                return Reply::Usage {
                    message: e.to_string(),
                }
            }
        };

        let result = match command {
            AdminCommand::Open(id) => self
                .tickets
                .open_ticket(admin, &id)
                .await
                .map(|opened| Reply::TicketOpened {
                    ticket_id: opened.ticket.id,
                    owner: opened.owner,
                    subject: opened.ticket.subject,
                    category: opened.ticket.category,
                    priority: opened.ticket.priority,
                    description: opened.ticket.description,
                    previous_focus: opened.previous_focus,
                }),
            AdminCommand::Close(id) => self
                .tickets
                .close_ticket(admin, &id)
                .await
                .map(|closed| Reply::TicketClosed {
                    ticket_id: closed.ticket_id,
                }),
            AdminCommand::Reply(message) => self
                .tickets
                .route_admin_message(admin, &message)
                .await
                .map(|forwarded| Reply::Forwarded {
                    ticket_id: forwarded.ticket_id,
                    recipients: forwarded.recipients.len(),
                }),
        };
        result.unwrap_or_else(core_failure)
    }

    pub async fn on_user_direct_message(&self, user: &UserHandle, text: &str) -> Reply {
        self.try_user_message(user, text)
            .await
            .unwrap_or_else(core_failure)
    }

    async fn try_user_message(&self, user: &UserHandle, text: &str) -> Result<Reply> {
        let Some(account) = self.ledger.find(user).await? else {
            return Ok(Reply::NeedsAccount);
        };
        let forwarded = self.tickets.route_user_message(account.id, text).await?;
        Ok(Reply::Forwarded {
            ticket_id: forwarded.ticket_id,
            recipients: forwarded.recipients.len(),
        })
    }

    // ---- commands ----

    /// Login hook: create or refresh the caller's account.
    pub async fn register(&self, handle: &UserHandle, username: &str) -> Reply {
        match self.ledger.register(handle, username).await {
            Ok(account) => Reply::Registered {
                account_id: account.id,
                balance: account.balance,
            },
            Err(e) => core_failure(e),
        }
    }

    /// Balance of `target`, or of the caller when no target is given.
    pub async fn balance(&self, user: &UserHandle, target: Option<&UserHandle>) -> Reply {
        match self.ledger.require(target.unwrap_or(user)).await {
            Ok(account) => Reply::Balance {
                user: account.handle,
                balance: account.balance,
                invites: account.invite_count,
                servers_joined: account.servers_joined,
            },
            Err(e) => core_failure(e),
        }
    }

    /// Open a general support ticket for the caller.
    pub async fn support(&self, user: &UserHandle, message: &str) -> Reply {
        let message = message.trim();
        if message.is_empty() {
            return Reply::Usage {
                message: "Please describe the problem: /support <message>".to_string(),
            };
        }
        self.try_support(user, message)
            .await
            .unwrap_or_else(core_failure)
    }

    async fn try_support(&self, user: &UserHandle, message: &str) -> Result<Reply> {
        let account = self.ledger.require(user).await?;
        let created = self
            .tickets
            .create_ticket(account.id, NewTicket::general(message))
            .await?;
        Ok(Reply::TicketCreated {
            ticket_id: created.ticket.id,
        })
    }

    /// Give coins to another user. The receiver is notified best-effort.
    pub async fn gift(&self, from: &UserHandle, to: &UserHandle, amount: &str, message: &str) -> Reply {
        self.try_gift(from, to, amount, message)
            .await
            .unwrap_or_else(core_failure)
    }

    async fn try_gift(&self, from: &UserHandle, to: &UserHandle, amount: &str, message: &str) -> Result<Reply> {
        if from == to {
            return Err(CoreError::SelfTransfer);
        }
        let amount = ledger::parse_amount(amount)?;

        let sender = self.ledger.require(from).await?;
        let receiver = self.ledger.require(to).await?;
        let receipt = self.ledger.transfer(sender.id, receiver.id, amount).await?;

        notify::dispatch_one(
            self.notifier.clone(),
            receiver.handle.clone(),
            Notice::GiftReceived {
                from: from.clone(),
                amount,
                balance: receipt.to_balance,
                message: message.to_string(),
            },
        );

        Ok(Reply::GiftSent {
            to: receiver.handle,
            amount,
            balance: receipt.from_balance,
        })
    }
}
