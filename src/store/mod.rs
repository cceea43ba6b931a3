use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use teloxide::types::ChatId;

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ChatId> for RecipientId {
    fn from(chat_id: ChatId) -> Self {
        Self(chat_id.0)
    }
}

impl From<RecipientId> for ChatId {
    fn from(id: RecipientId) -> Self {
        ChatId(id.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredPrayerRequest")]
pub struct PrayerRequest {
    pub text: String,
    /// Unknown for requests written as bare strings by older versions of the bot.
    pub submitted_at: Option<DateTime<Local>>,
}

/// Accepted on-disk forms of a prayer request.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPrayerRequest {
    Text(String),
    Full {
        text: String,
        #[serde(default)]
        submitted_at: Option<DateTime<Local>>,
    },
}

impl From<StoredPrayerRequest> for PrayerRequest {
    fn from(stored: StoredPrayerRequest) -> Self {
        match stored {
            StoredPrayerRequest::Text(text) => Self {
                text,
                submitted_at: None,
            },
            StoredPrayerRequest::Full { text, submitted_at } => Self { text, submitted_at },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub prayer_requests: Vec<PrayerRequest>,
}

/// Everything a store knows, keyed by recipient. This is also the on-disk layout.
pub(crate) type RecipientMap = BTreeMap<RecipientId, Recipient>;

/// Storage for known recipients and the prayer requests they submitted.
///
/// Submitting content requires a prior `register`; unknown ids are rejected with
/// [`StorageError::UnknownRecipient`] and leave the store unchanged.
#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Adds `id` if absent. Returns `true` when the id was not known before.
    async fn register(&self, id: RecipientId) -> Result<bool, StorageError>;

    /// Snapshot of every registered id, in no meaningful order.
    async fn list_all(&self) -> Result<Vec<RecipientId>, StorageError>;

    async fn record_submission(&self, id: RecipientId, text: String) -> Result<(), StorageError>;

    async fn submissions(&self, id: RecipientId) -> Result<Vec<PrayerRequest>, StorageError>;

    async fn language(&self, id: RecipientId) -> Result<Option<String>, StorageError>;

    async fn set_language(&self, id: RecipientId, language: String) -> Result<(), StorageError>;
}

// mutations shared by all store implementations

pub(crate) fn register_in(map: &mut RecipientMap, id: RecipientId) -> bool {
    if map.contains_key(&id) {
        return false;
    }
    map.insert(id, Recipient::default());
    true
}

pub(crate) fn get_in(map: &RecipientMap, id: RecipientId) -> Result<&Recipient, StorageError> {
    map.get(&id).ok_or(StorageError::UnknownRecipient(id))
}

pub(crate) fn get_mut_in(
    map: &mut RecipientMap,
    id: RecipientId,
) -> Result<&mut Recipient, StorageError> {
    map.get_mut(&id).ok_or(StorageError::UnknownRecipient(id))
}

pub(crate) fn submit_in(
    map: &mut RecipientMap,
    id: RecipientId,
    text: String,
) -> Result<(), StorageError> {
    get_mut_in(map, id)?.prayer_requests.push(PrayerRequest {
        text,
        submitted_at: Some(Local::now()),
    });
    Ok(())
}
