//! guildkeep: console front end
//!
//! Reads newline-delimited JSON envelopes (platform events and user
//! commands) from stdin and writes one JSON reply per line to stdout.
//!
//! ## Configuration
//! - First argument: path to a YAML config file (optional)
//! - GUILDKEEP_CONFIG: path to a YAML config file (optional)
//! - GUILDKEEP__*: per-key overrides, e.g. GUILDKEEP__SUPPORT__ADMINS=1,2
//! - GUILDKEEP_LOG: tracing filter (default: info), logs go to stderr

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use guildkeep::config::Config;
use guildkeep::dispatch::{Console, Dispatcher};
use guildkeep::notify::LogNotifier;
use guildkeep::platform::InviteRegistry;
use guildkeep::storage::init_storage;
use guildkeep::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    let (ledger_store, ticket_store) = init_storage(&config.storage).await?;
    let registry = Arc::new(InviteRegistry::new());
    let dispatcher = Dispatcher::new(
        &config,
        ledger_store,
        ticket_store,
        registry.clone(),
        Arc::new(LogNotifier),
    );
    dispatcher.on_ready().await;
    let console = Console::new(dispatcher, registry);

    info!(
        admins = config.support.admins.len(),
        invite_bonus = config.rewards.invite_bonus,
        welcome_bonus = config.rewards.welcome_bonus,
        "guildkeep started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if let Some(reply) = console.handle_line(&line).await {
            let mut out = serde_json::to_string(&reply)?;
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
