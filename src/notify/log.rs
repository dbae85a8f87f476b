//! Tracing-backed notifier.

use async_trait::async_trait;
use tracing::info;

use super::{Notice, Notifier, NotifyError};
use crate::model::UserHandle;

/// Notifier that writes every notice to the log.
///
/// Stands in for the chat platform's direct-message API when running the
/// console binary.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, recipient: &UserHandle, notice: &Notice) -> Result<(), NotifyError> {
        info!(recipient = %recipient, notice = %notice, "notify");
        Ok(())
    }
}
