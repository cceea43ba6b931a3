//! Command behavior, kept apart from teloxide types so it can be driven from tests.
//!
//! Every function returns the text to reply with. Storage failures other than an
//! unknown recipient are returned as errors; [`or_failure`] turns them into a reply.

use crate::auth::AdminList;
use crate::broadcast::{self, BroadcastSummary, Content, Transport};
use crate::content::{ContentPool, Quiz};
use crate::error::StorageError;
use crate::store::{RecipientId, RecipientStore};
use crate::util;
use miette::Report;
use std::future::Future;

pub const WELCOME: &str = "🙏 Welcome to Church Youth Bot! Use /help to see commands.";
pub const NOT_REGISTERED: &str = "Please send /start first so I know who you are.";
pub const NOT_AUTHORIZED: &str = "❌ You are not authorized to do that.";
pub const NO_VERSES: &str = "No verses found.";
pub const NO_QUIZ: &str = "No quiz questions available.";
pub const FAILED: &str = "⚠️ Could not complete that, please try again later.";

/// Reply text for `result`; a storage failure is logged and answered with [`FAILED`].
pub fn or_failure(result: Result<String, StorageError>) -> String {
    result.unwrap_or_else(|error| {
        log::error!("Command failed.\n{}", util::render_report(&Report::new(error)));
        FAILED.to_string()
    })
}

pub async fn start(store: &dyn RecipientStore, id: RecipientId) -> Result<String, StorageError> {
    if store.register(id).await? {
        log::info!("Registered new recipient {id}");
    }
    Ok(WELCOME.to_string())
}

pub fn verse(content: &ContentPool, salt: u64) -> String {
    match content.random_verse(salt) {
        Some(verse) => format!("{}{verse}", broadcast::DAILY_VERSE_PREFIX),
        None => NO_VERSES.to_string(),
    }
}

pub fn inspiration(content: &ContentPool, salt: u64) -> String {
    content
        .random_inspiration(salt)
        .cloned()
        .unwrap_or_else(|| "🙏 God is always with you.".to_string())
}

pub fn events(content: &ContentPool) -> String {
    if content.events.is_empty() {
        return "🗓 No upcoming events.".to_string();
    }
    let mut result = String::from("🗓 Upcoming Events:\n");
    for event in &content.events {
        result.push_str(&event.name);
        result.push_str(" at ");
        result.push_str(&event.time.format("%H:%M").to_string());
        result.push('\n');
    }
    result
}

pub async fn prayer(
    store: &dyn RecipientStore,
    id: RecipientId,
    text: &str,
) -> Result<String, StorageError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok("Please provide your prayer request after /prayer command.".to_string());
    }
    match store.record_submission(id, text.to_string()).await {
        Ok(()) => Ok("🙏 Your prayer request has been recorded!".to_string()),
        Err(StorageError::UnknownRecipient(_)) => Ok(NOT_REGISTERED.to_string()),
        Err(error) => Err(error),
    }
}

pub async fn my_prayers(store: &dyn RecipientStore, id: RecipientId) -> Result<String, StorageError> {
    let requests = match store.submissions(id).await {
        Ok(requests) => requests,
        Err(StorageError::UnknownRecipient(_)) => return Ok(NOT_REGISTERED.to_string()),
        Err(error) => return Err(error),
    };
    if requests.is_empty() {
        return Ok("You have not submitted any prayer requests yet.".to_string());
    }

    let mut result = String::from("🙏 Your prayer requests:\n");
    for request in requests {
        if let Some(submitted_at) = request.submitted_at {
            result.push_str(&submitted_at.format("%Y-%m-%d").to_string());
            result.push_str(": ");
        }
        result.push_str(&request.text);
        result.push('\n');
    }
    Ok(result)
}

pub async fn language(
    store: &dyn RecipientStore,
    id: RecipientId,
    tag: &str,
) -> Result<String, StorageError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Ok(match store.language(id).await {
            Ok(Some(current)) => format!("Your language is {current}."),
            Ok(None) => "Usage: /language <code>, e.g. /language en".to_string(),
            Err(StorageError::UnknownRecipient(_)) => NOT_REGISTERED.to_string(),
            Err(error) => return Err(error),
        });
    }
    match store.set_language(id, tag.to_string()).await {
        Ok(()) => Ok(format!("Language set to {tag}.")),
        Err(StorageError::UnknownRecipient(_)) => Ok(NOT_REGISTERED.to_string()),
        Err(error) => Err(error),
    }
}

/// Picks a question to remember for the chat, with the text to ask it.
pub fn new_quiz(content: &ContentPool, salt: u64) -> (Option<Quiz>, String) {
    match content.random_quiz(salt) {
        Some(quiz) => (Some(quiz.clone()), format!("❓ Quiz: {}", quiz.question)),
        None => (None, NO_QUIZ.to_string()),
    }
}

pub fn quiz_answer(current: Option<&Quiz>, answer: &str) -> String {
    match current {
        None => "Please start a quiz with /quiz first.".to_string(),
        Some(quiz) if quiz.is_correct(answer) => "✅ Correct!".to_string(),
        Some(quiz) => format!("❌ Wrong! Correct answer: {}", quiz.answer),
    }
}

/// Fans an administrator's announcement out to every registered recipient.
pub async fn announce(
    admins: &AdminList,
    store: &dyn RecipientStore,
    transport: &dyn Transport,
    caller: RecipientId,
    text: &str,
) -> Result<String, StorageError> {
    if admins.authorize(caller).is_err() {
        return Ok(NOT_AUTHORIZED.to_string());
    }
    let text = text.trim();
    if text.is_empty() {
        return Ok("Please provide a message to broadcast.".to_string());
    }

    log::info!("{caller} started a broadcast");
    let message = format!("{}{text}", broadcast::ANNOUNCEMENT_PREFIX);
    let summary = broadcast::broadcast_to_store(store, transport, Content::Literal(message)).await?;
    Ok(broadcast_done(summary))
}

pub fn broadcast_done(summary: BroadcastSummary) -> String {
    format!("✅ Broadcast sent: {summary}")
}

/// Runs the daily verse broadcast on behalf of an administrator.
///
/// `request` is only awaited once the caller is authorized and there is a verse
/// to send; it yields `None` when the broadcast could not be carried out.
pub async fn push_verse(
    admins: &AdminList,
    content: &ContentPool,
    caller: RecipientId,
    request: impl Future<Output = Option<BroadcastSummary>>,
) -> String {
    if admins.authorize(caller).is_err() {
        return NOT_AUTHORIZED.to_string();
    }
    if content.verses.is_empty() {
        return NO_VERSES.to_string();
    }
    match request.await {
        Some(summary) => broadcast_done(summary),
        None => {
            log::error!("Daily verse pushed by {caller} was not carried out");
            FAILED.to_string()
        }
    }
}

pub async fn recipients(
    admins: &AdminList,
    store: &dyn RecipientStore,
    caller: RecipientId,
) -> Result<String, StorageError> {
    if admins.authorize(caller).is_err() {
        return Ok(NOT_AUTHORIZED.to_string());
    }
    let ids = store.list_all().await?;
    let mut result = format!("👥 {} registered recipient(s)\n", ids.len());
    for id in ids {
        result.push_str(&id.to_string());
        result.push('\n');
    }
    Ok(result)
}
