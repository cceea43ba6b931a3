use crate::broadcast::{self, Content};
use crate::content::ContentPool;
use crate::scheduler::{register_to_schedule, MyScheduler};
use crate::telegram_bot::TelegramControlCommand;
use crate::util;
use async_cron_scheduler::JobId;
use chrono::{Local, NaiveTime};
use miette::{miette, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Requests one reminder broadcast per event starting in the minute of `now`.
/// Returns how many were requested.
pub(super) fn check(
    content: &ContentPool,
    now: NaiveTime,
    telegram_send: &mpsc::UnboundedSender<TelegramControlCommand>,
) -> Result<usize> {
    let mut requested = 0;
    for event in content.events_at(now) {
        log::info!("Event {} starts now", event.name);
        telegram_send
            .send(TelegramControlCommand::Broadcast {
                content: Content::Literal(broadcast::event_reminder(&event.name)),
                return_send: None,
            })
            .map_err(|_| miette!("Telegram bot no longer accepts reminders for {}", event.name))?;
        requested += 1;
    }
    Ok(requested)
}

pub(super) fn start(
    cron_str: &str,
    scheduler: &mut MyScheduler,
    content: Arc<ContentPool>,
    telegram_send: Arc<mpsc::UnboundedSender<TelegramControlCommand>>,
) -> Result<JobId> {
    let job_id = register_to_schedule(cron_str, scheduler, move |_id| {
        if let Err(report) = check(&content, Local::now().time(), &telegram_send) {
            log::error!("Event check failed.\n{}", util::render_report(&report));
        }
    })?;
    log::info!("Registered event reminders for {cron_str}");
    Ok(job_id)
}
