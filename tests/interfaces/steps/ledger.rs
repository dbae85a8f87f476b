//! Ledger transfer step definitions.

use std::collections::HashMap;

use cucumber::{given, then, when, World};
use futures::future::join_all;

use guildkeep::error::CoreError;
use guildkeep::model::TransferReceipt;

use crate::backend::{ServiceContext, StorageBackend};

/// Test context for ledger scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct LedgerWorld {
    backend: StorageBackend,
    context: Option<ServiceContext>,
    supply_before: i64,
    last_result: Option<Result<TransferReceipt, String>>,
    last_error_kind: Option<&'static str>,
    race_outcomes: HashMap<String, bool>,
}

impl LedgerWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            supply_before: 0,
            last_result: None,
            last_error_kind: None,
            race_outcomes: HashMap::new(),
        }
    }

    fn ctx(&self) -> &ServiceContext {
        self.context.as_ref().expect("Service context not initialized")
    }

    async fn supply(&self, handles: &[&str]) -> i64 {
        let mut total = 0;
        for handle in handles {
            total += self.ctx().balance(handle).await;
        }
        total
    }

    fn record(&mut self, result: Result<TransferReceipt, CoreError>) {
        self.last_error_kind = result.as_ref().err().map(CoreError::kind);
        self.last_result = Some(result.map_err(|e| e.to_string()));
    }
}

// --- Background ---

#[given("a ledger backend")]
async fn given_ledger_backend(world: &mut LedgerWorld) {
    println!("Using backend: {}", world.backend.name());
    world.context = Some(ServiceContext::new(world.backend, &[]).await);
}

// --- Given steps ---

#[given(expr = "an account {string} with {int} coins")]
async fn given_account_with_coins(world: &mut LedgerWorld, handle: String, coins: i64) {
    world.ctx().account_with(&handle, coins).await;
}

// --- When steps ---

#[when(expr = "{string} transfers {int} coins to {string}")]
async fn when_transfer(world: &mut LedgerWorld, from: String, amount: i64, to: String) {
    world.supply_before = world.supply(&[&from, &to]).await;
    let from_id = world.ctx().account_id(&from).await;
    let to_id = world.ctx().account_id(&to).await;
    let result = world
        .ctx()
        .dispatcher
        .ledger()
        .transfer(from_id, to_id, amount)
        .await;
    world.record(result);
}

#[when(expr = "{string} concurrently transfers {int} coins to {string} and {int} coins to {string}")]
async fn when_concurrent_transfers(
    world: &mut LedgerWorld,
    from: String,
    first_amount: i64,
    first_to: String,
    second_amount: i64,
    second_to: String,
) {
    let ctx = world.ctx();
    let from_id = ctx.account_id(&from).await;
    let targets = [
        (first_to.clone(), ctx.account_id(&first_to).await, first_amount),
        (second_to.clone(), ctx.account_id(&second_to).await, second_amount),
    ];

    let ledger = ctx.dispatcher.ledger();
    let results = join_all(
        targets
            .iter()
            .map(|(_, to_id, amount)| ledger.transfer(from_id, *to_id, *amount)),
    )
    .await;

    let outcomes: HashMap<String, bool> = targets
        .iter()
        .zip(results.iter())
        .map(|((handle, _, _), result)| (handle.clone(), result.is_ok()))
        .collect();
    world.race_outcomes = outcomes;
}

// --- Then steps ---

#[then(expr = "{string} has {int} coins")]
async fn then_balance(world: &mut LedgerWorld, handle: String, coins: i64) {
    assert_eq!(world.ctx().balance(&handle).await, coins, "balance of {handle}");
}

#[then("the transfer succeeds")]
async fn then_transfer_succeeds(world: &mut LedgerWorld) {
    let result = world.last_result.as_ref().expect("no transfer attempted");
    assert!(result.is_ok(), "transfer failed: {:?}", result);
}

#[then(expr = "the transfer fails with {string}")]
async fn then_transfer_fails(world: &mut LedgerWorld, kind: String) {
    assert_eq!(world.last_error_kind, Some(kind.as_str()));
}

#[then(expr = "the combined balance of {string} and {string} is unchanged")]
async fn then_supply_unchanged(world: &mut LedgerWorld, a: String, b: String) {
    assert_eq!(world.supply(&[&a, &b]).await, world.supply_before);
}

#[then("exactly one of the concurrent transfers succeeds")]
async fn then_one_race_winner(world: &mut LedgerWorld) {
    let winners = world.race_outcomes.values().filter(|ok| **ok).count();
    assert_eq!(winners, 1, "outcomes: {:?}", world.race_outcomes);
}

#[then(expr = "{string} never goes negative")]
async fn then_not_negative(world: &mut LedgerWorld, handle: String) {
    assert!(world.ctx().balance(&handle).await >= 0);
}
