//! Invite attribution.
//!
//! Keeps one [`InviteSnapshot`] per community. On a join the live invite
//! list is diffed against the snapshot and the first invite whose usage grew
//! is credited to its inviter. This is a heuristic: if two invites were used
//! between snapshots only the first in platform order is attributed, and the
//! other join is lost.
//!
//! Each deployed instance keeps its own snapshots; nothing here is shared
//! across processes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::RewardsConfig;
use crate::ledger::{BonusFailure, BonusReceipt, BonusStage, Ledger};
use crate::model::{AccountCounter, CommunityId, UserHandle};
use crate::notify::{self, Delivery, Notice, Notifier};
use crate::platform::{Invite, InviteSource, PlatformError};

mod snapshot;

pub use snapshot::InviteSnapshot;

/// The invite a join was attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedInvite {
    pub code: String,
    pub uses: u64,
    pub inviter: Option<UserHandle>,
}

impl From<&Invite> for AttributedInvite {
    fn from(invite: &Invite) -> Self {
        Self {
            code: invite.code.clone(),
            uses: invite.uses,
            inviter: invite.inviter.clone(),
        }
    }
}

/// What happened to one bonus on a join.
#[derive(Debug)]
pub enum BonusOutcome {
    /// No invite, no inviter, or no ledger account to credit.
    NotEligible,
    Credited(BonusReceipt),
    /// Logged and reported; nothing is retried or rolled back.
    PartialFailure(BonusFailure),
}

impl BonusOutcome {
    pub fn is_credited(&self) -> bool {
        matches!(self, BonusOutcome::Credited(_))
    }
}

/// Result of processing one join event.
#[derive(Debug)]
pub struct JoinOutcome {
    pub invite: Option<AttributedInvite>,
    pub inviter_bonus: BonusOutcome,
    pub welcome_bonus: BonusOutcome,
    pub notifications: Vec<Delivery>,
}

/// Per-community invite snapshots plus the join bonus logic.
pub struct InviteTracker {
    source: Arc<dyn InviteSource>,
    ledger: Ledger,
    notifier: Arc<dyn Notifier>,
    rewards: RewardsConfig,
    snapshots: RwLock<HashMap<CommunityId, Arc<InviteSnapshot>>>,
}

impl InviteTracker {
    pub fn new(
        source: Arc<dyn InviteSource>,
        ledger: Ledger,
        notifier: Arc<dyn Notifier>,
        rewards: RewardsConfig,
    ) -> Self {
        Self {
            source,
            ledger,
            notifier,
            rewards,
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Current snapshot of a community, if one has been taken.
    pub async fn snapshot(&self, community: &CommunityId) -> Option<Arc<InviteSnapshot>> {
        self.snapshots.read().await.get(community).cloned()
    }

    async fn replace(&self, community: &CommunityId, snapshot: InviteSnapshot) {
        self.snapshots
            .write()
            .await
            .insert(community.clone(), Arc::new(snapshot));
    }

    /// Snapshot every community the service is present in.
    ///
    /// Communities whose invites cannot be listed are skipped and logged.
    /// Returns how many communities were seeded.
    pub async fn seed_all(&self) -> Result<usize, PlatformError> {
        let communities = self.source.communities().await?;
        let mut seeded = 0;
        for community in &communities {
            match self.source.invites(community).await {
                Ok(live) => {
                    self.replace(community, InviteSnapshot::from_invites(&live)).await;
                    seeded += 1;
                }
                Err(e) => {
                    warn!(community = %community, error = %e, "Failed to fetch invites");
                }
            }
        }
        info!(seeded, total = communities.len(), "Invite snapshots seeded");
        Ok(seeded)
    }

    /// Snapshot a community the service was just added to.
    pub async fn on_community_added(&self, community: &CommunityId) -> Result<(), PlatformError> {
        let live = self.source.invites(community).await?;
        self.replace(community, InviteSnapshot::from_invites(&live)).await;
        debug!(community = %community, invites = live.len(), "Community seeded");
        Ok(())
    }

    pub async fn on_invite_created(&self, community: &CommunityId, invite: &Invite) {
        let mut snapshots = self.snapshots.write().await;
        let next = match snapshots.get(community) {
            Some(current) => current.with_invite(invite),
            None => InviteSnapshot::from_invites(std::slice::from_ref(invite)),
        };
        snapshots.insert(community.clone(), Arc::new(next));
    }

    pub async fn on_invite_deleted(&self, community: &CommunityId, code: &str) {
        let mut snapshots = self.snapshots.write().await;
        if let Some(current) = snapshots.get(community) {
            let next = current.without(code);
            snapshots.insert(community.clone(), Arc::new(next));
        }
    }

    /// Attribute a join and apply the invite and welcome bonuses.
    ///
    /// A community without a prior snapshot never attributes, but is seeded.
    /// If the live invite list cannot be fetched the old snapshot is kept and
    /// only the welcome bonus is considered.
    #[tracing::instrument(name = "invites.on_join", skip_all, fields(community = %community, member = %member))]
    pub async fn on_join(&self, community: &CommunityId, member: &UserHandle) -> JoinOutcome {
        let prior = self.snapshot(community).await;

        let live = match self.source.invites(community).await {
            Ok(live) => Some(live),
            Err(e) => {
                warn!(error = %e, "Failed to fetch live invites, skipping attribution");
                None
            }
        };

        let invite = match (&prior, &live) {
            (Some(prior), Some(live)) => prior.find_used(live).map(AttributedInvite::from),
            _ => None,
        };

        if let Some(live) = &live {
            self.replace(community, InviteSnapshot::from_invites(live)).await;
        }

        let mut notifications = Vec::new();

        let inviter_bonus = match invite.as_ref().and_then(|i| i.inviter.as_ref()) {
            Some(inviter) => {
                self.reward_inviter(community, inviter, member, &mut notifications)
                    .await
            }
            None => {
                debug!(attributed = invite.is_some(), "No inviter to reward");
                BonusOutcome::NotEligible
            }
        };

        let welcome_bonus = self.welcome(community, member, &mut notifications).await;

        JoinOutcome {
            invite,
            inviter_bonus,
            welcome_bonus,
            notifications,
        }
    }

    async fn reward_inviter(
        &self,
        community: &CommunityId,
        inviter: &UserHandle,
        member: &UserHandle,
        notifications: &mut Vec<Delivery>,
    ) -> BonusOutcome {
        let account = match self.ledger.find(inviter).await {
            Ok(Some(account)) => account,
            Ok(None) => return BonusOutcome::NotEligible,
            Err(error) => {
                warn!(inviter = %inviter, error = %error, "Invite bonus lookup failed");
                return BonusOutcome::PartialFailure(BonusFailure {
                    stage: BonusStage::Credit,
                    error,
                });
            }
        };

        match self
            .ledger
            .award(account.id, self.rewards.invite_bonus, AccountCounter::Invites)
            .await
        {
            Ok(receipt) => {
                info!(inviter = %inviter, balance = receipt.balance, invites = receipt.count, "Invite bonus credited");
                notifications.push(notify::dispatch_one(
                    self.notifier.clone(),
                    inviter.clone(),
                    Notice::InviteReward {
                        member: member.clone(),
                        community: community.to_string(),
                        amount: self.rewards.invite_bonus,
                        balance: receipt.balance,
                        invites: receipt.count,
                    },
                ));
                BonusOutcome::Credited(receipt)
            }
            Err(failure) => {
                warn!(inviter = %inviter, stage = %failure.stage, error = %failure.error, "Invite bonus partially applied");
                BonusOutcome::PartialFailure(failure)
            }
        }
    }

    async fn welcome(
        &self,
        community: &CommunityId,
        member: &UserHandle,
        notifications: &mut Vec<Delivery>,
    ) -> BonusOutcome {
        let account = match self.ledger.find(member).await {
            Ok(Some(account)) => account,
            Ok(None) => return BonusOutcome::NotEligible,
            Err(error) => {
                warn!(error = %error, "Welcome bonus lookup failed");
                return BonusOutcome::PartialFailure(BonusFailure {
                    stage: BonusStage::Credit,
                    error,
                });
            }
        };

        match self
            .ledger
            .award(account.id, self.rewards.welcome_bonus, AccountCounter::ServersJoined)
            .await
        {
            Ok(receipt) => {
                info!(balance = receipt.balance, servers_joined = receipt.count, "Welcome bonus credited");
                notifications.push(notify::dispatch_one(
                    self.notifier.clone(),
                    member.clone(),
                    Notice::WelcomeBonus {
                        community: community.to_string(),
                        amount: self.rewards.welcome_bonus,
                    },
                ));
                BonusOutcome::Credited(receipt)
            }
            Err(failure) => {
                warn!(stage = %failure.stage, error = %failure.error, "Welcome bonus partially applied");
                BonusOutcome::PartialFailure(failure)
            }
        }
    }
}
