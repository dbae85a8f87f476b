//! Chat-platform boundary consumed by the invite tracker.
//!
//! The platform client itself is external; this module only names what the
//! core needs from it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::model::{CommunityId, UserHandle};

/// Errors raised when talking to the chat platform.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    #[error("Community {0} is not available")]
    UnknownCommunity(CommunityId),

    #[error("Missing permission to list invites in {0}")]
    Forbidden(CommunityId),

    #[error("Platform request failed: {0}")]
    Request(String),
}

/// An invite link and its live usage count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub code: String,
    #[serde(default)]
    pub uses: u64,
    #[serde(default)]
    pub inviter: Option<UserHandle>,
}

impl Invite {
    pub fn new(code: impl Into<String>, uses: u64, inviter: Option<UserHandle>) -> Self {
        Self {
            code: code.into(),
            uses,
            inviter,
        }
    }
}

/// Lists communities and their active invites.
#[async_trait]
pub trait InviteSource: Send + Sync {
    /// Every community the service is present in.
    async fn communities(&self) -> Result<Vec<CommunityId>, PlatformError>;

    /// Active invites of one community, in the order the platform returns them.
    async fn invites(&self, community: &CommunityId) -> Result<Vec<Invite>, PlatformError>;
}

/// In-memory invite source, fed by whoever observes the platform.
#[derive(Default)]
pub struct InviteRegistry {
    communities: RwLock<HashMap<CommunityId, Vec<Invite>>>,
}

impl InviteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the invite list of a community (registers it if new).
    pub async fn set_invites(&self, community: CommunityId, invites: Vec<Invite>) {
        self.communities.write().await.insert(community, invites);
    }

    /// Bump an invite's usage count, as the platform does when someone joins through it.
    pub async fn record_use(&self, community: &CommunityId, code: &str) -> bool {
        let mut communities = self.communities.write().await;
        match communities
            .get_mut(community)
            .and_then(|invites| invites.iter_mut().find(|i| i.code == code))
        {
            Some(invite) => {
                invite.uses += 1;
                true
            }
            None => false,
        }
    }

    /// Add an invite, or replace the one with the same code.
    pub async fn upsert_invite(&self, community: &CommunityId, invite: Invite) {
        let mut communities = self.communities.write().await;
        let invites = communities.entry(community.clone()).or_default();
        match invites.iter_mut().find(|i| i.code == invite.code) {
            Some(existing) => *existing = invite,
            None => invites.push(invite),
        }
    }

    pub async fn remove_invite(&self, community: &CommunityId, code: &str) {
        if let Some(invites) = self.communities.write().await.get_mut(community) {
            invites.retain(|i| i.code != code);
        }
    }
}

#[async_trait]
impl InviteSource for InviteRegistry {
    async fn communities(&self) -> Result<Vec<CommunityId>, PlatformError> {
        let mut ids: Vec<CommunityId> = self.communities.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn invites(&self, community: &CommunityId) -> Result<Vec<Invite>, PlatformError> {
        self.communities
            .read()
            .await
            .get(community)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownCommunity(community.clone()))
    }
}
