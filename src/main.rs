mod auth;
mod broadcast;
mod content;
mod error;
mod options;
mod scheduler;
mod store;
mod telegram_bot;
mod util;

use miette::Result;
use std::sync::Arc;
use store::{JsonFileStore, MemoryStore, RecipientStore};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_graceful_shutdown::Toplevel;

#[tokio::main]
async fn main() -> Result<()> {
    // Query command line options and initialize logging
    let opts = options::parse()?;

    // Compose shared state
    let store: Arc<dyn RecipientStore> = if opts.ephemeral {
        log::warn!("Running with an in-memory store, registrations are lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::open(opts.users_file()).await?)
    };
    let content = Arc::new(content::ContentPool::load(&opts.data_dir).await?);
    let admins = Arc::new(auth::AdminList::new(opts.admin_ids.iter().copied()));
    if admins.is_empty() {
        log::warn!("No administrators configured, admin commands are disabled");
    } else {
        log::info!("{} administrator(s) configured", admins.len());
    }

    let opts_arc = Arc::new(opts);
    let content_arc2 = content.clone();
    let content_arc1 = content;

    let (sched_send, sched_recv) = mpsc::unbounded_channel();
    let (telegram_send, telegram_recv) = mpsc::unbounded_channel();

    // Initialize and run subsystems
    Toplevel::new()
        .start("scheduler", move |subsys| {
            scheduler::subsystem_handler(opts_arc, sched_recv, telegram_send, content_arc1, subsys)
        })
        .start("telegram bot", move |subsys| {
            telegram_bot::subsystem_handler(
                telegram_recv,
                sched_send,
                store,
                content_arc2,
                admins,
                subsys,
            )
        })
        .catch_signals()
        .handle_shutdown_requests(Duration::from_secs(20))
        .await
        .map_err(Into::into)
}
