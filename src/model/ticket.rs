//! Support tickets and their lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, TicketId};

pub const DEFAULT_SUBJECT: &str = "Support Request";
pub const DEFAULT_CATEGORY: &str = "general";

/// Ticket lifecycle status.
///
/// Ordered `Pending < Open < Closed`; a ticket only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Open => "open",
            TicketStatus::Closed => "closed",
        }
    }

    /// Whether a ticket in this status may move to `next`. Staying put counts.
    pub fn can_advance_to(&self, next: TicketStatus) -> bool {
        next >= *self
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TicketStatus::Pending),
            "open" => Ok(TicketStatus::Open),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            "urgent" => Ok(TicketPriority::Urgent),
            other => Err(format!("unknown ticket priority: {other}")),
        }
    }
}

/// A user's request for support, before it has an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub category: String,
    pub priority: TicketPriority,
    pub description: String,
}

impl NewTicket {
    /// A general-category request with the default subject and priority.
    pub fn general(description: impl Into<String>) -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: TicketPriority::default(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub account_id: AccountId,
    pub subject: String,
    pub category: String,
    pub priority: TicketPriority,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}
