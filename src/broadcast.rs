use crate::content;
use crate::error::{DeliveryError, StorageError};
use crate::store::{RecipientId, RecipientStore};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::fmt;

/// Sends started at once during a fan-out pass.
const MAX_CONCURRENT_SENDS: usize = 16;

pub const ANNOUNCEMENT_PREFIX: &str = "📢 Announcement:\n";
pub const DAILY_VERSE_PREFIX: &str = "📖 Daily Verse:\n";

pub fn event_reminder(event_name: &str) -> String {
    format!("⏰ Event Reminder: {event_name} starts now!")
}

/// The outbound half of the messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(DeliveryError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub sent: usize,
    pub failed: usize,
}

impl fmt::Display for BroadcastSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sent, {} failed", self.sent, self.failed)
    }
}

/// What to fan out: literal text is passed through untouched, a pool gets one
/// random pick that every recipient of the pass receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Literal(String),
    RandomFrom(Vec<String>),
}

impl Content {
    pub fn resolve(self, salt: u64) -> Option<String> {
        match self {
            Content::Literal(text) => Some(text),
            Content::RandomFrom(pool) => content::pick(&pool, salt).cloned(),
        }
    }
}

/// Attempts one delivery of `content` to every recipient.
///
/// Attempts are independent and unordered; a failed one is logged and counted
/// but neither retried nor allowed to hold back the others.
pub async fn broadcast(
    transport: &dyn Transport,
    content: &str,
    recipients: &[RecipientId],
) -> BroadcastSummary {
    if recipients.is_empty() {
        log::debug!("Broadcast skipped, there are no recipients");
        return BroadcastSummary::default();
    }

    let summary = stream::iter(recipients.iter().copied())
        .map(|recipient| async move {
            match transport.send(recipient, content).await {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(error) => DeliveryOutcome::Failed(error),
            }
        })
        .buffer_unordered(MAX_CONCURRENT_SENDS)
        .fold(BroadcastSummary::default(), |mut summary, outcome| async move {
            match outcome {
                DeliveryOutcome::Delivered => summary.sent += 1,
                DeliveryOutcome::Failed(error) => {
                    log::warn!("{error}");
                    summary.failed += 1;
                }
            }
            summary
        })
        .await;

    log::info!("Broadcast to {} recipient(s) finished: {summary}", recipients.len());
    summary
}

/// Snapshots the store and fans `content` out to everyone in it.
///
/// Fails only when the snapshot cannot be taken. Resolving to nothing (an empty
/// pool) sends nothing.
pub async fn broadcast_to_store(
    store: &dyn RecipientStore,
    transport: &dyn Transport,
    content: Content,
) -> Result<BroadcastSummary, StorageError> {
    let recipients = store.list_all().await?;
    let Some(text) = content.resolve(recipients.len() as u64) else {
        log::warn!("Nothing to broadcast, the content pool is empty");
        return Ok(BroadcastSummary::default());
    };
    Ok(broadcast(transport, &text, &recipients).await)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records every send; fails for the ids in `failing`.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) failing: HashSet<RecipientId>,
        pub(crate) sent: Mutex<Vec<(RecipientId, String)>>,
    }

    impl RecordingTransport {
        pub(crate) fn failing_for(ids: &[i64]) -> Self {
            Self {
                failing: ids.iter().copied().map(RecipientId).collect(),
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<(RecipientId, String)> {
            let mut calls = self.sent.lock().unwrap().clone();
            calls.sort();
            calls
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, recipient: RecipientId, text: &str) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push((recipient, text.to_string()));
            if self.failing.contains(&recipient) {
                return Err(DeliveryError {
                    recipient,
                    reason: "bot was blocked by the user".into(),
                });
            }
            Ok(())
        }
    }

    fn ids(raw: &[i64]) -> Vec<RecipientId> {
        raw.iter().copied().map(RecipientId).collect()
    }

    #[tokio::test]
    async fn empty_recipient_set_makes_no_calls() {
        let transport = RecordingTransport::default();

        let summary = broadcast(&transport, "hello", &[]).await;

        assert_eq!(summary, BroadcastSummary { sent: 0, failed: 0 });
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let transport = RecordingTransport::failing_for(&[2]);

        let summary = broadcast(&transport, "hello", &ids(&[1, 2, 3, 4])).await;

        assert_eq!(summary, BroadcastSummary { sent: 3, failed: 1 });
        let reached: Vec<_> = transport.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(reached, ids(&[1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn literal_content_is_never_substituted() {
        let store = MemoryStore::new();
        for id in [1001, 1002, 1003] {
            store.register(RecipientId(id)).await.unwrap();
        }
        let transport = RecordingTransport::default();

        let summary = broadcast_to_store(&store, &transport, Content::Literal("A".into()))
            .await
            .unwrap();

        assert_eq!(summary, BroadcastSummary { sent: 3, failed: 0 });
        assert_eq!(
            transport.calls(),
            vec![
                (RecipientId(1001), "A".to_string()),
                (RecipientId(1002), "A".to_string()),
                (RecipientId(1003), "A".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn pool_pick_is_shared_by_all_recipients() {
        let store = MemoryStore::new();
        for id in [1, 2, 3] {
            store.register(RecipientId(id)).await.unwrap();
        }
        let transport = RecordingTransport::default();

        let pool = vec!["A".to_string(), "B".to_string()];
        broadcast_to_store(&store, &transport, Content::RandomFrom(pool.clone()))
            .await
            .unwrap();

        let texts: HashSet<_> = transport.calls().into_iter().map(|(_, text)| text).collect();
        assert_eq!(texts.len(), 1);
        assert!(pool.contains(texts.iter().next().unwrap()));
    }

    #[tokio::test]
    async fn empty_pool_sends_nothing() {
        let store = MemoryStore::new();
        store.register(RecipientId(1)).await.unwrap();
        let transport = RecordingTransport::default();

        let summary = broadcast_to_store(&store, &transport, Content::RandomFrom(Vec::new()))
            .await
            .unwrap();

        assert_eq!(summary, BroadcastSummary::default());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn event_reminder_names_the_event() {
        assert_eq!(event_reminder("Youth night"), "⏰ Event Reminder: Youth night starts now!");
    }
}
