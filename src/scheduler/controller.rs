use crate::broadcast::BroadcastSummary;
use crate::content::ContentPool;
use crate::scheduler::daily_verse;
use crate::telegram_bot::TelegramControlCommand;
use miette::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use SchedulerControlCommand::*;

#[derive(Debug)]
pub enum SchedulerControlCommand {
    /// Run the daily verse job now and report the counts through `return_send`.
    PushDailyVerse {
        return_send: oneshot::Sender<BroadcastSummary>,
    },
}

pub(super) async fn handle(
    command: SchedulerControlCommand,
    content: Arc<ContentPool>,
    telegram_send: Arc<mpsc::UnboundedSender<TelegramControlCommand>>,
) -> Result<()> {
    match command {
        PushDailyVerse { return_send } => {
            log::info!("Daily verse pushed on demand");
            daily_verse::push(&content, &telegram_send, Some(return_send))
        }
    }
}
