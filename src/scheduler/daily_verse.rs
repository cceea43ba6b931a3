use crate::broadcast::{BroadcastSummary, Content, DAILY_VERSE_PREFIX};
use crate::content::ContentPool;
use crate::scheduler::{register_to_schedule, MyScheduler};
use crate::telegram_bot::TelegramControlCommand;
use crate::util;
use async_cron_scheduler::JobId;
use miette::{miette, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Asks the bot to send one random verse from the pool to everyone.
pub(super) fn push(
    content: &ContentPool,
    telegram_send: &mpsc::UnboundedSender<TelegramControlCommand>,
    return_send: Option<oneshot::Sender<BroadcastSummary>>,
) -> Result<()> {
    if content.verses.is_empty() {
        log::warn!("Daily verse requested, but there are no verses");
    }
    let verses = content
        .verses
        .iter()
        .map(|verse| format!("{DAILY_VERSE_PREFIX}{verse}"))
        .collect();

    log::info!("Sending daily verse");
    telegram_send
        .send(TelegramControlCommand::Broadcast {
            content: Content::RandomFrom(verses),
            return_send,
        })
        .map_err(|_| miette!("Telegram bot no longer accepts the daily verse"))
}

pub(super) fn start(
    cron_str: &str,
    scheduler: &mut MyScheduler,
    content: Arc<ContentPool>,
    telegram_send: Arc<mpsc::UnboundedSender<TelegramControlCommand>>,
) -> Result<JobId> {
    let job_id = register_to_schedule(cron_str, scheduler, move |_id| {
        if let Err(report) = push(&content, &telegram_send, None) {
            log::error!("Daily verse failed.\n{}", util::render_report(&report));
        }
    })?;
    log::info!("Registered daily verse for {cron_str}");
    Ok(job_id)
}
