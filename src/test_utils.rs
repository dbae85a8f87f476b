//! Test doubles and fixtures.
//!
//! Available to unit tests and, behind the `test-utils` feature, to the
//! integration test binaries.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::dispatch::{Console, Dispatcher};
use crate::model::{AccountId, Ticket, TicketId, TicketPriority, TicketStatus, UserHandle};
use crate::notify::{Notice, Notifier, NotifyError};
use crate::platform::InviteRegistry;
use crate::storage::mock::{MockLedgerStore, MockTicketStore};

/// Notifier that remembers every notice it was asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    received: RwLock<Vec<(UserHandle, Notice)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn received_by(&self, recipient: &UserHandle) -> Vec<Notice> {
        self.received
            .read()
            .await
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    pub async fn total(&self) -> usize {
        self.received.read().await.len()
    }

    /// Wait until at least `count` notices arrived, giving up after a second.
    ///
    /// Fan-outs run on spawned tasks, so callers that dropped the
    /// [`Delivery`](crate::notify::Delivery) handle use this to observe them.
    pub async fn wait_for(&self, count: usize) -> bool {
        for _ in 0..200 {
            if self.total().await >= count {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        self.total().await >= count
    }

    pub async fn clear(&self) {
        self.received.write().await.clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, recipient: &UserHandle, notice: &Notice) -> Result<(), NotifyError> {
        self.received
            .write()
            .await
            .push((recipient.clone(), notice.clone()));
        Ok(())
    }
}

/// Notifier that refuses some (or all) recipients and records the rest.
pub struct FailingNotifier {
    recorder: Arc<RecordingNotifier>,
    unreachable: HashSet<UserHandle>,
    fail_all: bool,
}

impl FailingNotifier {
    pub fn for_recipients<'a>(recipients: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            recorder: Arc::new(RecordingNotifier::new()),
            unreachable: recipients.into_iter().map(UserHandle::new).collect(),
            fail_all: false,
        }
    }

    pub fn always() -> Self {
        Self {
            recorder: Arc::new(RecordingNotifier::new()),
            unreachable: HashSet::new(),
            fail_all: true,
        }
    }

    /// Notices that did get through.
    pub fn recorder(&self) -> Arc<RecordingNotifier> {
        self.recorder.clone()
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, recipient: &UserHandle, notice: &Notice) -> Result<(), NotifyError> {
        if self.fail_all || self.unreachable.contains(recipient) {
            return Err(NotifyError::Unreachable(recipient.clone()));
        }
        self.recorder.deliver(recipient, notice).await
    }
}

/// A pending general ticket with a fixed id.
pub fn make_ticket(account_id: AccountId, id: &str) -> Ticket {
    Ticket {
        id: TicketId::new(id),
        account_id,
        subject: "Support Request".to_string(),
        category: "general".to_string(),
        priority: TicketPriority::Medium,
        description: "test ticket".to_string(),
        status: TicketStatus::Pending,
        created_at: Utc::now(),
    }
}

/// A full service wired to in-memory stores and a recording notifier.
pub struct Harness {
    pub ledger_store: Arc<MockLedgerStore>,
    pub ticket_store: Arc<MockTicketStore>,
    pub registry: Arc<InviteRegistry>,
    pub notifier: Arc<RecordingNotifier>,
    pub console: Console,
}

impl Harness {
    pub fn new(admins: &[&str]) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut config = Config::for_test();
        config.support.admins = admins.iter().map(|a| UserHandle::new(*a)).collect();

        let ledger_store = Arc::new(MockLedgerStore::new());
        let ticket_store = Arc::new(MockTicketStore::new());
        let registry = Arc::new(InviteRegistry::new());
        let dispatcher = Dispatcher::new(
            &config,
            ledger_store.clone(),
            ticket_store.clone(),
            registry.clone(),
            notifier.clone(),
        );

        Self {
            ledger_store,
            ticket_store,
            registry: registry.clone(),
            notifier,
            console: Console::new(dispatcher, registry),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.console.dispatcher()
    }
}
