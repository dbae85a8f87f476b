//! Shared storage integration tests.
//!
//! Tests the LedgerStore and TicketStore interfaces against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod ledger_store_tests;
pub mod ticket_store_tests;

use chrono::{DateTime, Duration, TimeZone, Utc};

use guildkeep::model::{AccountId, Ticket, TicketId, TicketPriority, TicketStatus};

/// Fixed base instant so stored timestamps compare exactly after a round trip.
pub fn at(offset_ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::milliseconds(offset_ms)
}

pub fn ticket(id: &str, account_id: AccountId, offset_ms: i64) -> Ticket {
    Ticket {
        id: TicketId::new(id),
        account_id,
        subject: "Support Request".to_string(),
        category: "general".to_string(),
        priority: TicketPriority::High,
        description: format!("description of {id}"),
        status: TicketStatus::Pending,
        created_at: at(offset_ms),
    }
}
