use crate::auth::AdminList;
use crate::content::{ContentPool, Quiz};
use crate::scheduler::SchedulerControlCommand;
use crate::store::{RecipientId, RecipientStore};
use crate::telegram_bot::replies;
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::{dialogue, ShutdownToken, UpdateHandler};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::{dptree, Bot};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Per-chat conversation state.
#[derive(Clone, Debug, Default)]
pub struct QuizState {
    current_quiz: Option<Quiz>,
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum ChannelCommand {
    #[command(description = "Register to receive daily verses and reminders.")]
    Start,
    #[command(description = "Send this message.")]
    Help,
    #[command(description = "A random verse.")]
    Verse,
    #[command(description = "Submit a prayer request.\n\tUsage: /prayer <text>")]
    Prayer(String),
    #[command(description = "Show your prayer requests.")]
    MyPrayers,
    #[command(description = "Show upcoming events.")]
    Events,
    #[command(description = "Bible knowledge quiz.")]
    Quiz,
    #[command(description = "Answer the current quiz.\n\tUsage: /answer <text>")]
    Answer(String),
    #[command(rename = "daily_inspiration", description = "A motivational quote.")]
    Inspiration,
    #[command(description = "Set your preferred language.\n\tUsage: /language <code>")]
    Language(String),
    #[command(description = "Admin: send an announcement to everyone.\n\tUsage: /broadcast <text>")]
    Broadcast(String),
    #[command(description = "Admin: send the daily verse now.")]
    PushVerse,
    #[command(description = "Admin: list registered recipients.")]
    Recipients,
}

pub type QuizStorage = InMemStorage<QuizState>;
type QuizDialogue = Dialogue<QuizState, QuizStorage>;

/// Who issued the command; falls back to the chat for anonymous senders.
fn caller(msg: &Message) -> RecipientId {
    msg.from()
        .map(|user| RecipientId(user.id.0 as i64))
        .unwrap_or_else(|| msg.chat.id.into())
}

/// Salt for random picks so parallel chats do not draw the same item.
fn salt(msg: &Message) -> u64 {
    (msg.chat.id.0 as u64) ^ (msg.id.0 as u64)
}

async fn reply(bot: &Bot, msg: &Message, text: String) -> Result<()> {
    bot.send_message(msg.chat.id, text).await.into_diagnostic()?;
    Ok(())
}

async fn start(bot: Bot, store: Arc<dyn RecipientStore>, msg: Message) -> Result<()> {
    let text = replies::or_failure(replies::start(store.as_ref(), msg.chat.id.into()).await);
    reply(&bot, &msg, text).await
}

async fn help(bot: Bot, msg: Message) -> Result<()> {
    reply(&bot, &msg, ChannelCommand::descriptions().to_string()).await
}

async fn verse(bot: Bot, content: Arc<ContentPool>, msg: Message) -> Result<()> {
    reply(&bot, &msg, replies::verse(&content, salt(&msg))).await
}

async fn prayer(
    bot: Bot,
    store: Arc<dyn RecipientStore>,
    command: ChannelCommand,
    msg: Message,
) -> Result<()> {
    if let ChannelCommand::Prayer(text) = command {
        let text = replies::or_failure(replies::prayer(store.as_ref(), msg.chat.id.into(), &text).await);
        reply(&bot, &msg, text).await
    } else {
        Err(miette::miette!("Handler for prayer command did not receive correct data"))
    }
}

async fn my_prayers(bot: Bot, store: Arc<dyn RecipientStore>, msg: Message) -> Result<()> {
    let text = replies::or_failure(replies::my_prayers(store.as_ref(), msg.chat.id.into()).await);
    reply(&bot, &msg, text).await
}

async fn events(bot: Bot, content: Arc<ContentPool>, msg: Message) -> Result<()> {
    reply(&bot, &msg, replies::events(&content)).await
}

async fn quiz(
    bot: Bot,
    content: Arc<ContentPool>,
    dialogue: QuizDialogue,
    msg: Message,
) -> Result<()> {
    let (quiz, text) = replies::new_quiz(&content, salt(&msg));
    if quiz.is_some() {
        let mut state = dialogue.get_or_default().await.into_diagnostic()?;
        state.current_quiz = quiz;
        dialogue.update(state).await.into_diagnostic()?;
    }

    reply(&bot, &msg, text).await
}

async fn answer(bot: Bot, dialogue: QuizDialogue, command: ChannelCommand, msg: Message) -> Result<()> {
    if let ChannelCommand::Answer(answer) = command {
        let state = dialogue.get_or_default().await.into_diagnostic()?;
        let text = replies::quiz_answer(state.current_quiz.as_ref(), &answer);
        reply(&bot, &msg, text).await
    } else {
        Err(miette::miette!("Handler for answer command did not receive correct data"))
    }
}

async fn inspiration(bot: Bot, content: Arc<ContentPool>, msg: Message) -> Result<()> {
    reply(&bot, &msg, replies::inspiration(&content, salt(&msg))).await
}

async fn language(
    bot: Bot,
    store: Arc<dyn RecipientStore>,
    command: ChannelCommand,
    msg: Message,
) -> Result<()> {
    if let ChannelCommand::Language(tag) = command {
        let text = replies::or_failure(replies::language(store.as_ref(), msg.chat.id.into(), &tag).await);
        reply(&bot, &msg, text).await
    } else {
        Err(miette::miette!("Handler for language command did not receive correct data"))
    }
}

async fn broadcast(
    bot: Bot,
    admins: Arc<AdminList>,
    store: Arc<dyn RecipientStore>,
    command: ChannelCommand,
    msg: Message,
) -> Result<()> {
    if let ChannelCommand::Broadcast(text) = command {
        let text =
            replies::or_failure(replies::announce(&admins, store.as_ref(), &bot, caller(&msg), &text).await);
        reply(&bot, &msg, text).await
    } else {
        Err(miette::miette!("Handler for broadcast command did not receive correct data"))
    }
}

async fn push_verse(
    bot: Bot,
    admins: Arc<AdminList>,
    content: Arc<ContentPool>,
    sched_send: mpsc::UnboundedSender<SchedulerControlCommand>,
    msg: Message,
) -> Result<()> {
    let request = async move {
        let (send, recv) = oneshot::channel();
        sched_send
            .send(SchedulerControlCommand::PushDailyVerse { return_send: send })
            .ok()?;
        recv.await.ok()
    };
    let text = replies::push_verse(&admins, &content, caller(&msg), request).await;
    reply(&bot, &msg, text).await
}

async fn recipients(
    bot: Bot,
    admins: Arc<AdminList>,
    store: Arc<dyn RecipientStore>,
    msg: Message,
) -> Result<()> {
    let text = replies::or_failure(replies::recipients(&admins, store.as_ref(), caller(&msg)).await);
    reply(&bot, &msg, text).await
}

fn schema() -> UpdateHandler<miette::Error> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<ChannelCommand, _>()
        .branch(case![ChannelCommand::Start].endpoint(start))
        .branch(case![ChannelCommand::Help].endpoint(help))
        .branch(case![ChannelCommand::Verse].endpoint(verse))
        .branch(case![ChannelCommand::Prayer(text)].endpoint(prayer))
        .branch(case![ChannelCommand::MyPrayers].endpoint(my_prayers))
        .branch(case![ChannelCommand::Events].endpoint(events))
        .branch(case![ChannelCommand::Quiz].endpoint(quiz))
        .branch(case![ChannelCommand::Answer(answer)].endpoint(answer))
        .branch(case![ChannelCommand::Inspiration].endpoint(inspiration))
        .branch(case![ChannelCommand::Language(tag)].endpoint(language))
        .branch(case![ChannelCommand::Broadcast(text)].endpoint(broadcast))
        .branch(case![ChannelCommand::PushVerse].endpoint(push_verse))
        .branch(case![ChannelCommand::Recipients].endpoint(recipients));

    let message_handler = Update::filter_message().branch(command_handler);

    dialogue::enter::<Update, QuizStorage, QuizState, _>().branch(message_handler)
}

pub async fn setup(
    bot: Bot,
    store: Arc<dyn RecipientStore>,
    content: Arc<ContentPool>,
    admins: Arc<AdminList>,
    sched_send: mpsc::UnboundedSender<SchedulerControlCommand>,
) -> (ShutdownToken, JoinHandle<()>) {
    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![
            QuizStorage::new(),
            store,
            content,
            admins,
            sched_send
        ])
        .build();
    let shutdown_token = dispatcher.shutdown_token();
    let join_handle = tokio::spawn(async move { dispatcher.dispatch().await });
    (shutdown_token, join_handle)
}
