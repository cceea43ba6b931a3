use super::{get_in, get_mut_in, register_in, submit_in, PrayerRequest, RecipientId, RecipientMap, RecipientStore};
use crate::error::StorageError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Store kept as one JSON object mapping recipient id to its record.
///
/// The whole file is rewritten on every mutation. Writes go to a sibling
/// temporary file which is then renamed over the original, so readers never
/// observe a partially written store. When a write fails the in-memory state
/// keeps its previous value.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    recipients: RwLock<RecipientMap>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let recipients = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => RecipientMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| StorageError::Format {
                path: path.display().to_string(),
                source,
            })?,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                log::info!("No recipient store at {}, starting empty", path.display());
                RecipientMap::new()
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        log::debug!("Loaded {} recipient(s) from {}", recipients.len(), path.display());

        Ok(Self {
            path,
            recipients: RwLock::new(recipients),
        })
    }

    async fn persist(&self, recipients: &RecipientMap) -> Result<(), StorageError> {
        let io_error = |source: std::io::Error| StorageError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let contents = serde_json::to_string_pretty(recipients).map_err(|source| StorageError::Format {
            path: self.path.display().to_string(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, contents).await.map_err(io_error)?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(io_error)
    }

    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut RecipientMap) -> Result<T, StorageError> + Send,
    ) -> Result<T, StorageError> {
        let mut recipients = self.recipients.write().await;
        let mut next = recipients.clone();
        let value = change(&mut next)?;
        self.persist(&next).await?;
        *recipients = next;
        Ok(value)
    }
}

#[async_trait]
impl RecipientStore for JsonFileStore {
    async fn register(&self, id: RecipientId) -> Result<bool, StorageError> {
        if self.recipients.read().await.contains_key(&id) {
            return Ok(false);
        }
        self.mutate(|recipients| Ok(register_in(recipients, id))).await
    }

    async fn list_all(&self) -> Result<Vec<RecipientId>, StorageError> {
        Ok(self.recipients.read().await.keys().copied().collect())
    }

    async fn record_submission(&self, id: RecipientId, text: String) -> Result<(), StorageError> {
        self.mutate(|recipients| submit_in(recipients, id, text)).await
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
        self.mutate(|recipients| {
            get_mut_in(recipients, id)?.language = Some(language);
            Ok(())
        })
        .await
    }
}
