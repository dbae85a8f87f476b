//! Line-oriented driver standing in for the chat-platform client.
//!
//! Each input line is one JSON [`Envelope`]; each produces one [`Reply`].

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{Dispatcher, Reply};
use crate::model::{CommunityId, UserHandle};
use crate::platform::{Invite, InviteRegistry};

/// A coin amount as typed by a user. Anything that is not a whole `i64` or
/// text is kept verbatim so that it is rejected as an invalid amount rather
/// than as a malformed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Whole(i64),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Whole(n) => write!(f, "{n}"),
            Amount::Text(s) => f.write_str(s),
            Amount::Other(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Re-snapshot every known community.
    Ready,
    /// The service was added to a community with these invites.
    CommunityAdded {
        community: CommunityId,
        #[serde(default)]
        invites: Vec<Invite>,
    },
    /// Replace a community's live invite list.
    Invites {
        community: CommunityId,
        invites: Vec<Invite>,
    },
    /// Someone joined through `code`; the platform bumps its usage count.
    InviteUsed {
        community: CommunityId,
        code: String,
    },
    InviteCreated {
        community: CommunityId,
        invite: Invite,
    },
    InviteDeleted {
        community: CommunityId,
        code: String,
    },
    Join {
        community: CommunityId,
        member: UserHandle,
    },
    DirectMessage {
        author: UserHandle,
        text: String,
    },
    Register {
        handle: UserHandle,
        username: String,
    },
    Balance {
        user: UserHandle,
        #[serde(default)]
        target: Option<UserHandle>,
    },
    Gift {
        from: UserHandle,
        to: UserHandle,
        amount: Amount,
        #[serde(default)]
        message: String,
    },
    Support {
        user: UserHandle,
        message: String,
    },
}

/// Feeds envelopes to a [`Dispatcher`], keeping the invite registry in step.
pub struct Console {
    dispatcher: Dispatcher,
    registry: Arc<InviteRegistry>,
}

impl Console {
    pub fn new(dispatcher: Dispatcher, registry: Arc<InviteRegistry>) -> Self {
        Self {
            dispatcher,
            registry,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one input line. Blank lines produce no reply.
    pub async fn handle_line(&self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => Some(self.handle(envelope).await),
            Err(e) => {
                debug!(error = %e, "Malformed envelope");
                Some(Reply::Error {
                    kind: "malformed".to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    pub async fn handle(&self, envelope: Envelope) -> Reply {
        let dispatcher = &self.dispatcher;
        match envelope {
            Envelope::Ready => dispatcher.on_ready().await,
            Envelope::CommunityAdded { community, invites } => {
                self.registry.set_invites(community.clone(), invites).await;
                dispatcher.on_community_added(&community).await
            }
            Envelope::Invites { community, invites } => {
                self.registry.set_invites(community, invites).await;
                Reply::Acknowledged
            }
            Envelope::InviteUsed { community, code } => {
                if self.registry.record_use(&community, &code).await {
                    Reply::Acknowledged
                } else {
                    Reply::Error {
                        kind: "not_found".to_string(),
                        message: format!("invite not found: {code}"),
                    }
                }
            }
            Envelope::InviteCreated { community, invite } => {
                self.registry.upsert_invite(&community, invite.clone()).await;
                dispatcher.on_invite_created(&community, &invite).await
            }
            Envelope::InviteDeleted { community, code } => {
                self.registry.remove_invite(&community, &code).await;
                dispatcher.on_invite_deleted(&community, &code).await
            }
            Envelope::Join { community, member } => dispatcher.on_join(&community, &member).await,
            Envelope::DirectMessage { author, text } => {
                dispatcher.on_direct_message(&author, &text).await
            }
            Envelope::Register { handle, username } => dispatcher.register(&handle, &username).await,
            Envelope::Balance { user, target } => {
                dispatcher.balance(&user, target.as_ref()).await
            }
            Envelope::Gift {
                from,
                to,
                amount,
                message,
            } => {
                dispatcher
                    .gift(&from, &to, &amount.to_string(), &message)
                    .await
            }
            Envelope::Support { user, message } => dispatcher.support(&user, &message).await,
        }
    }
}
