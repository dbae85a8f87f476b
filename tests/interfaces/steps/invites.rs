//! Invite attribution step definitions.

use cucumber::{gherkin::Step, given, then, when, World};

use guildkeep::invites::JoinOutcome;
use guildkeep::model::{CommunityId, UserHandle};
use guildkeep::platform::Invite;

use crate::backend::{ServiceContext, StorageBackend};

const COMMUNITY: &str = "community-1";

/// Test context for invite attribution scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct InviteWorld {
    backend: StorageBackend,
    context: Option<ServiceContext>,
    last_join: Option<JoinOutcome>,
}

impl InviteWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            last_join: None,
        }
    }

    fn ctx(&self) -> &ServiceContext {
        self.context.as_ref().expect("Service context not initialized")
    }

    fn community() -> CommunityId {
        CommunityId::new(COMMUNITY)
    }

    fn join(&self) -> &JoinOutcome {
        self.last_join.as_ref().expect("no join processed")
    }
}

/// Rows of `| code | uses | inviter |`, header first.
fn invites_from_table(step: &Step) -> Vec<Invite> {
    let table = step.table.as_ref().expect("step needs an invite table");
    table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let inviter = row
                .get(2)
                .filter(|s| !s.is_empty())
                .map(|s| UserHandle::new(s.as_str()));
            Invite::new(row[0].clone(), row[1].parse().expect("uses is a number"), inviter)
        })
        .collect()
}

// --- Background ---

#[given("an invite tracker")]
async fn given_tracker(world: &mut InviteWorld) {
    println!("Using backend: {}", world.backend.name());
    world.context = Some(ServiceContext::new(world.backend, &[]).await);
}

// --- Given steps ---

#[given(expr = "an account {string} with {int} coins")]
async fn given_account(world: &mut InviteWorld, handle: String, coins: i64) {
    world.ctx().account_with(&handle, coins).await;
}

#[given("the community has these invites when the service starts:")]
async fn given_seeded_invites(world: &mut InviteWorld, step: &Step) {
    let ctx = world.ctx();
    ctx.registry
        .set_invites(InviteWorld::community(), invites_from_table(step))
        .await;
    let seeded = ctx
        .dispatcher
        .invites()
        .seed_all()
        .await
        .expect("seeding should succeed");
    assert_eq!(seeded, 1);
}

#[given("the community has these invites but no snapshot:")]
async fn given_unseeded_invites(world: &mut InviteWorld, step: &Step) {
    world
        .ctx()
        .registry
        .set_invites(InviteWorld::community(), invites_from_table(step))
        .await;
}

#[given("the live invites are now:")]
async fn given_live_invites(world: &mut InviteWorld, step: &Step) {
    world
        .ctx()
        .registry
        .set_invites(InviteWorld::community(), invites_from_table(step))
        .await;
}

// --- When steps ---

#[when(expr = "{string} joins the community")]
async fn when_join(world: &mut InviteWorld, member: String) {
    let outcome = world
        .ctx()
        .dispatcher
        .invites()
        .on_join(&InviteWorld::community(), &UserHandle::new(member))
        .await;
    world.last_join = Some(outcome);
}

// --- Then steps ---

#[then(expr = "the join is attributed to invite {string}")]
async fn then_attributed(world: &mut InviteWorld, code: String) {
    let invite = world.join().invite.as_ref().expect("join was not attributed");
    assert_eq!(invite.code, code);
}

#[then("the join is not attributed")]
async fn then_not_attributed(world: &mut InviteWorld) {
    assert!(world.join().invite.is_none());
}

#[then(expr = "the snapshot records {int} uses for invite {string}")]
async fn then_snapshot(world: &mut InviteWorld, uses: u64, code: String) {
    let snapshot = world
        .ctx()
        .dispatcher
        .invites()
        .snapshot(&InviteWorld::community())
        .await
        .expect("community has a snapshot");
    assert_eq!(snapshot.get(&code), Some(uses));
}

#[then(expr = "{string} has {int} coins and {int} invites")]
async fn then_inviter_state(world: &mut InviteWorld, handle: String, coins: i64, invites: i64) {
    let id = world.ctx().account_id(&handle).await;
    let account = world.ctx().dispatcher.ledger().account(id).await.unwrap();
    assert_eq!(account.balance, coins, "balance of {handle}");
    assert_eq!(account.invite_count, invites, "invites of {handle}");
}

#[then(expr = "{string} has {int} coins and joined {int} servers")]
async fn then_member_state(world: &mut InviteWorld, handle: String, coins: i64, joined: i64) {
    let id = world.ctx().account_id(&handle).await;
    let account = world.ctx().dispatcher.ledger().account(id).await.unwrap();
    assert_eq!(account.balance, coins, "balance of {handle}");
    assert_eq!(account.servers_joined, joined, "servers joined by {handle}");
}
