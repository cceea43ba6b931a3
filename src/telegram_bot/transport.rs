use crate::broadcast::Transport;
use crate::error::DeliveryError;
use crate::store::RecipientId;
use async_trait::async_trait;
use teloxide::prelude::*;

#[async_trait]
impl Transport for Bot {
    async fn send(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(ChatId::from(recipient), text)
            .await
            .map(|_| ())
            .map_err(|error| DeliveryError {
                recipient,
                reason: error.to_string(),
            })
    }
}
