use crate::broadcast::{self, BroadcastSummary, Content};
use crate::store::RecipientStore;
use miette::{miette, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::oneshot;

use TelegramControlCommand::*;
#[derive(Debug)]
pub enum TelegramControlCommand {
    /// Fan `content` out to every registered recipient, optionally reporting the counts back.
    Broadcast {
        content: Content,
        return_send: Option<oneshot::Sender<BroadcastSummary>>,
    },
}

pub(super) async fn handle(
    command: TelegramControlCommand,
    bot: Bot,
    store: Arc<dyn RecipientStore>,
) -> Result<()> {
    match command {
        Broadcast {
            content,
            return_send,
        } => {
            let summary = broadcast::broadcast_to_store(store.as_ref(), &bot, content).await?;
            if let Some(return_send) = return_send {
                return_send
                    .send(summary)
                    .map_err(|_| miette!("Broadcast requester went away before the result ({summary})"))?;
            }
            Ok(())
        }
    }
}
