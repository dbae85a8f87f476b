//! Last-observed invite usage counts for one community.

use std::collections::HashMap;

use crate::platform::Invite;

/// Invite code to usage count, as last observed.
///
/// Immutable once built; updates produce a new snapshot that replaces the
/// old one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InviteSnapshot {
    uses: HashMap<String, u64>,
}

impl InviteSnapshot {
    pub fn from_invites(invites: &[Invite]) -> Self {
        Self {
            uses: invites
                .iter()
                .map(|invite| (invite.code.clone(), invite.uses))
                .collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<u64> {
        self.uses.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.uses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }

    /// First invite, in `live` order, whose count grew since this snapshot.
    ///
    /// Codes missing from the snapshot count as zero. When several invites
    /// were used since the snapshot only the first one is returned.
    pub fn find_used<'a>(&self, live: &'a [Invite]) -> Option<&'a Invite> {
        live.iter()
            .find(|invite| invite.uses > self.get(&invite.code).unwrap_or(0))
    }

    pub fn with_invite(&self, invite: &Invite) -> Self {
        let mut uses = self.uses.clone();
        uses.insert(invite.code.clone(), invite.uses);
        Self { uses }
    }

    pub fn without(&self, code: &str) -> Self {
        let mut uses = self.uses.clone();
        uses.remove(code);
        Self { uses }
    }
}
