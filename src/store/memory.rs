use super::{get_in, get_mut_in, register_in, submit_in, PrayerRequest, RecipientId, RecipientMap, RecipientStore};
use crate::error::StorageError;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Store without persistence; everything is lost when the process ends.
#[derive(Debug, Default)]
pub struct MemoryStore {
    recipients: RwLock<RecipientMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipientStore for MemoryStore {
    async fn register(&self, id: RecipientId) -> Result<bool, StorageError> {
        Ok(register_in(&mut *self.recipients.write().await, id))
    }

    async fn list_all(&self) -> Result<Vec<RecipientId>, StorageError> {
        Ok(self.recipients.read().await.keys().copied().collect())
    }

    async fn record_submission(&self, id: RecipientId, text: String) -> Result<(), StorageError> {
        submit_in(&mut *self.recipients.write().await, id, text)
    }

    async fn submissions(&self, id: RecipientId) -> Result<Vec<PrayerRequest>, StorageError> {
        let recipients = self.recipients.read().await;
        Ok(get_in(&recipients, id)?.prayer_requests.clone())
    }

    async fn language(&self, id: RecipientId) -> Result<Option<String>, StorageError> {
        let recipients = self.recipients.read().await;
        Ok(get_in(&recipients, id)?.language.clone())
    }

    async fn set_language(&self, id: RecipientId, language: String) -> Result<(), StorageError> {
        get_mut_in(&mut *self.recipients.write().await, id)?.language = Some(language);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registering_twice_keeps_one_entry() {
        let store = MemoryStore::new();

        assert!(store.register(RecipientId(1001)).await.unwrap());
        assert!(!store.register(RecipientId(1001)).await.unwrap());

        assert_eq!(store.list_all().await.unwrap(), vec![RecipientId(1001)]);
    }

    #[tokio::test]
    async fn submission_from_unknown_recipient_is_rejected() {
        let store = MemoryStore::new();
        store.register(RecipientId(1)).await.unwrap();

        let err = store
            .record_submission(RecipientId(2), "pray for exams".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownRecipient(RecipientId(2))));

        assert_eq!(store.list_all().await.unwrap(), vec![RecipientId(1)]);
        assert!(store.submissions(RecipientId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submissions_are_kept_in_order() {
        let store = MemoryStore::new();
        store.register(RecipientId(5)).await.unwrap();
        store.record_submission(RecipientId(5), "first".into()).await.unwrap();
        store.record_submission(RecipientId(5), "second".into()).await.unwrap();

        let texts: Vec<_> = store
            .submissions(RecipientId(5))
            .await
            .unwrap()
            .into_iter()
            .map(|request| request.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn language_is_optional_until_set() {
        let store = MemoryStore::new();
        store.register(RecipientId(9)).await.unwrap();
        assert_eq!(store.language(RecipientId(9)).await.unwrap(), None);

        store.set_language(RecipientId(9), "my".into()).await.unwrap();
        assert_eq!(store.language(RecipientId(9)).await.unwrap().as_deref(), Some("my"));

        assert!(store.set_language(RecipientId(10), "en".into()).await.is_err());
    }
}
