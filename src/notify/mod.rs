//! Best-effort outbound notifications.
//!
//! Delivery never feeds back into ledger or ticket state: a notice is handed
//! to a spawned task, failures are logged there, and the caller moves on.
//! The returned [`Delivery`] handle exists so tests (and curious callers)
//! can observe what happened.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::{TicketId, UserHandle};

mod log;

pub use log::LogNotifier;

/// Errors raised by a notifier backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifyError {
    #[error("Recipient {0} is unreachable")]
    Unreachable(UserHandle),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Outbound message kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    GiftReceived {
        from: UserHandle,
        amount: i64,
        balance: i64,
        message: String,
    },
    InviteReward {
        member: UserHandle,
        community: String,
        amount: i64,
        balance: i64,
        invites: i64,
    },
    WelcomeBonus {
        community: String,
        amount: i64,
    },
    TicketCreated {
        ticket_id: TicketId,
        description: String,
    },
    NewTicket {
        ticket_id: TicketId,
        user: UserHandle,
        description: String,
    },
    TicketOpened {
        ticket_id: TicketId,
    },
    SupportReply {
        ticket_id: TicketId,
        text: String,
    },
    UserMessage {
        ticket_id: TicketId,
        user: UserHandle,
        text: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::GiftReceived {
                from,
                amount,
                balance,
                message,
            } => write!(
                f,
                "{from} sent you {amount} coins: {message} (balance: {balance} coins)"
            ),
            Notice::InviteReward {
                member,
                community,
                amount,
                balance,
                invites,
            } => write!(
                f,
                "You earned {amount} coins for inviting {member} to {community}! Balance: {balance} coins. Total invites: {invites}"
            ),
            Notice::WelcomeBonus { community, amount } => write!(
                f,
                "Welcome to {community}! You received {amount} coins as a welcome bonus!"
            ),
            Notice::TicketCreated {
                ticket_id,
                description,
            } => write!(f, "Support ticket {ticket_id} created: {description}"),
            Notice::NewTicket {
                ticket_id,
                user,
                description,
            } => write!(f, "New support ticket {ticket_id} from {user}: {description}"),
            Notice::TicketOpened { ticket_id } => {
                write!(f, "An admin is now reviewing your ticket {ticket_id}")
            }
            Notice::SupportReply { ticket_id, text } => {
                write!(f, "[{ticket_id}] Support: {text}")
            }
            Notice::UserMessage {
                ticket_id,
                user,
                text,
            } => write!(f, "[{ticket_id}] {user}: {text}"),
        }
    }
}

/// Delivers a notice to one platform identity.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, recipient: &UserHandle, notice: &Notice) -> Result<(), NotifyError>;
}

/// Outcome of one fan-out, for logging and tests only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<UserHandle>,
    pub failed: Vec<(UserHandle, String)>,
}

/// Handle to an in-flight fan-out.
#[derive(Debug)]
pub struct Delivery(Option<JoinHandle<DeliveryReport>>);

impl Delivery {
    /// A delivery with no recipients.
    pub fn none() -> Self {
        Self(None)
    }

    /// Wait for the fan-out to finish.
    pub async fn report(self) -> DeliveryReport {
        match self.0 {
            Some(handle) => match handle.await {
                Ok(report) => report,
                Err(e) => {
                    warn!(error = %e, "Notification task failed");
                    DeliveryReport::default()
                }
            },
            None => DeliveryReport::default(),
        }
    }
}

/// Deliver `notice` to every recipient concurrently on a spawned task.
///
/// A failure for one recipient does not affect the others.
pub fn dispatch(
    notifier: Arc<dyn Notifier>,
    recipients: Vec<UserHandle>,
    notice: Notice,
) -> Delivery {
    if recipients.is_empty() {
        return Delivery::none();
    }

    let handle = tokio::spawn(async move {
        let attempts = recipients.iter().map(|recipient| {
            let notifier = notifier.clone();
            let notice = &notice;
            async move {
                let result = notifier.deliver(recipient, notice).await;
                (recipient.clone(), result)
            }
        });

        let mut report = DeliveryReport::default();
        for (recipient, result) in join_all(attempts).await {
            match result {
                Ok(()) => {
                    debug!(recipient = %recipient, "Notice delivered");
                    report.delivered.push(recipient);
                }
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "Could not deliver notice");
                    report.failed.push((recipient, e.to_string()));
                }
            }
        }
        report
    });

    Delivery(Some(handle))
}

/// Deliver `notice` to a single recipient.
pub fn dispatch_one(notifier: Arc<dyn Notifier>, recipient: UserHandle, notice: Notice) -> Delivery {
    dispatch(notifier, vec![recipient], notice)
}
