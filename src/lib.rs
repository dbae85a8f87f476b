//! Guildkeep - chat community automation
//!
//! A coin ledger with atomic transfers, invite attribution for new members,
//! and support-ticket routing between users and an administrator pool.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod invites;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod platform;
pub mod storage;
pub mod tickets;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{CoreError, Result};
