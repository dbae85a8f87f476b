//! Domain types shared by the ledger, invite tracker and ticket router.

mod account;
mod ids;
mod ticket;

pub use account::{Account, AccountCounter, TransferReceipt};
pub use ids::{AccountId, CommunityId, TicketId, UserHandle};
pub use ticket::{NewTicket, Ticket, TicketPriority, TicketStatus, DEFAULT_CATEGORY, DEFAULT_SUBJECT};
