//! Time-based ticket identities.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::model::TicketId;

const TICKET_PREFIX: &str = "TKT-";
const TICKET_TIME_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Hands out `TKT-YYYYMMDDHHMMSSmmm` ids.
///
/// Ids are strictly increasing within a process: two requests in the same
/// millisecond get consecutive milliseconds, so lexical order is creation order.
#[derive(Debug, Default)]
pub struct TicketIdGenerator {
    last_millis: AtomicI64,
}

impl TicketIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id plus the instant it encodes, which doubles as the creation time.
    pub fn next(&self) -> (TicketId, DateTime<Utc>) {
        self.next_at(Utc::now())
    }

    pub(crate) fn next_at(&self, now: DateTime<Utc>) -> (TicketId, DateTime<Utc>) {
        let wanted = now.timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Relaxed);
        let millis = loop {
            let candidate = wanted.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(current) => last = current,
            }
        };

        let at = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(now);
        let id = TicketId::new(format!("{TICKET_PREFIX}{}", at.format(TICKET_TIME_FORMAT)));
        (id, at)
    }
}
