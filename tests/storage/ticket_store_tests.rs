//! TicketStore interface tests.
//!
//! Tickets reference accounts, so every test registers its owner through the
//! LedgerStore that shares the ticket store's database.

use guildkeep::model::{AccountId, TicketId, TicketStatus, UserHandle};
use guildkeep::storage::{LedgerStore, TicketStore};

use super::ticket;

async fn owner<L: LedgerStore + ?Sized>(ledger: &L, handle: &str) -> AccountId {
    ledger
        .register(&UserHandle::new(handle), handle)
        .await
        .expect("register should succeed")
        .id
}

// =============================================================================
// create / get tests
// =============================================================================

pub async fn test_create_and_get<L, T>(ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let account = owner(ledger, "tickets_create").await;
    let created = ticket("TKT-20260101120000001", account, 1);

    tickets.create(&created).await.expect("create should succeed");

    let stored = tickets
        .get(&created.id)
        .await
        .expect("get should succeed")
        .expect("ticket should exist");
    assert_eq!(stored, created);
}

pub async fn test_get_missing<L, T>(_ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let result = tickets.get(&TicketId::new("TKT-NOPE")).await.unwrap();
    assert!(result.is_none());
}

pub async fn test_duplicate_id_is_refused<L, T>(ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let account = owner(ledger, "tickets_duplicate").await;
    let first = ticket("TKT-20260101120000002", account, 2);
    tickets.create(&first).await.unwrap();

    let mut second = first.clone();
    second.description = "overwrite attempt".to_string();

    assert!(tickets.create(&second).await.is_err());
    let stored = tickets.get(&first.id).await.unwrap().unwrap();
    assert_eq!(stored.description, first.description);
}

// =============================================================================
// advance_status tests
// =============================================================================

pub async fn test_status_moves_forward<L, T>(ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let account = owner(ledger, "tickets_forward").await;
    let created = ticket("TKT-20260101120000003", account, 3);
    tickets.create(&created).await.unwrap();

    assert_eq!(
        tickets.advance_status(&created.id, TicketStatus::Open).await.unwrap(),
        Some(TicketStatus::Open)
    );
    assert_eq!(
        tickets.advance_status(&created.id, TicketStatus::Open).await.unwrap(),
        Some(TicketStatus::Open),
        "opening twice is a no-op"
    );
    assert_eq!(
        tickets
            .advance_status(&created.id, TicketStatus::Closed)
            .await
            .unwrap(),
        Some(TicketStatus::Closed)
    );
}

pub async fn test_closed_never_moves_back<L, T>(ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let account = owner(ledger, "tickets_closed").await;
    let created = ticket("TKT-20260101120000004", account, 4);
    tickets.create(&created).await.unwrap();
    tickets
        .advance_status(&created.id, TicketStatus::Closed)
        .await
        .unwrap();

    for next in [TicketStatus::Pending, TicketStatus::Open] {
        assert_eq!(
            tickets.advance_status(&created.id, next).await.unwrap(),
            Some(TicketStatus::Closed)
        );
    }
    let stored = tickets.get(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TicketStatus::Closed);
}

pub async fn test_advance_missing<L, T>(_ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let result = tickets
        .advance_status(&TicketId::new("TKT-GHOST"), TicketStatus::Open)
        .await
        .unwrap();
    assert_eq!(result, None);
}

// =============================================================================
// latest_open_for tests
// =============================================================================

pub async fn test_latest_open_ignores_pending_and_closed<L, T>(ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let account = owner(ledger, "tickets_latest_filter").await;
    assert!(tickets.latest_open_for(account).await.unwrap().is_none());

    let pending = ticket("TKT-20260101120000010", account, 10);
    let closed = ticket("TKT-20260101120000011", account, 11);
    tickets.create(&pending).await.unwrap();
    tickets.create(&closed).await.unwrap();
    tickets
        .advance_status(&closed.id, TicketStatus::Closed)
        .await
        .unwrap();

    assert!(tickets.latest_open_for(account).await.unwrap().is_none());
}

pub async fn test_latest_open_is_most_recent<L, T>(ledger: &L, tickets: &T)
where
    L: LedgerStore + ?Sized,
    T: TicketStore + ?Sized,
{
    let account = owner(ledger, "tickets_latest_recent").await;
    let other = owner(ledger, "tickets_latest_other").await;

    let older = ticket("TKT-20260101120000020", account, 20);
    let newer = ticket("TKT-20260101120000021", account, 21);
    let newest_pending = ticket("TKT-20260101120000022", account, 22);
    let foreign = ticket("TKT-20260101120000023", other, 23);
    for t in [&older, &newer, &newest_pending, &foreign] {
        tickets.create(t).await.unwrap();
    }
    for t in [&older, &newer, &foreign] {
        tickets.advance_status(&t.id, TicketStatus::Open).await.unwrap();
    }

    let latest = tickets.latest_open_for(account).await.unwrap().unwrap();
    assert_eq!(latest.id, newer.id);
    assert_eq!(latest.status, TicketStatus::Open);
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all TicketStore interface tests against a ledger/ticket store pair.
#[macro_export]
macro_rules! run_ticket_store_tests {
    ($ledger:expr, $tickets:expr) => {
        use $crate::storage::ticket_store_tests::*;

        test_create_and_get($ledger, $tickets).await;
        println!("  test_create_and_get: PASSED");

        test_get_missing($ledger, $tickets).await;
        println!("  test_get_missing: PASSED");

        test_duplicate_id_is_refused($ledger, $tickets).await;
        println!("  test_duplicate_id_is_refused: PASSED");

        test_status_moves_forward($ledger, $tickets).await;
        println!("  test_status_moves_forward: PASSED");

        test_closed_never_moves_back($ledger, $tickets).await;
        println!("  test_closed_never_moves_back: PASSED");

        test_advance_missing($ledger, $tickets).await;
        println!("  test_advance_missing: PASSED");

        test_latest_open_ignores_pending_and_closed($ledger, $tickets).await;
        println!("  test_latest_open_ignores_pending_and_closed: PASSED");

        test_latest_open_is_most_recent($ledger, $tickets).await;
        println!("  test_latest_open_is_most_recent: PASSED");
    };
}
