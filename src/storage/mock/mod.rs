//! Mock storage implementations for testing.

mod ledger_store;
mod ticket_store;

pub use ledger_store::MockLedgerStore;
pub use ticket_store::MockTicketStore;
