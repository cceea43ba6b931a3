use crate::content::ContentPool;
use crate::options;
use crate::telegram_bot::TelegramControlCommand;
use crate::util;
use async_cron_scheduler::{Job, JobId, Scheduler};
use chrono::Local;
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_graceful_shutdown::SubsystemHandle;

mod controller;
mod daily_verse;
mod event_reminder;

pub use controller::SchedulerControlCommand;

type MyScheduler = Scheduler<Local>;

#[derive(Debug, Clone, Eq, PartialEq)]
struct SchedulerStorage {
    daily_verse_job_id: JobId,
    event_reminder_job_id: JobId,
}

fn register_to_schedule(
    cron_str: &str,
    scheduler: &mut MyScheduler,
    command: impl Fn(JobId) + Send + Sync + 'static,
) -> Result<JobId> {
    let job = Job::cron(cron_str).into_diagnostic()?;
    Ok(scheduler.insert(job, command))
}

pub async fn subsystem_handler(
    options: Arc<options::Options>,
    mut sched_recv: mpsc::UnboundedReceiver<SchedulerControlCommand>,
    telegram_send: mpsc::UnboundedSender<TelegramControlCommand>,
    content: Arc<ContentPool>,
    subsys: SubsystemHandle,
) -> Result<()> {
    log::info!("Setting up scheduler service...");

    // setup schedule
    let (mut scheduler, sched_service) = MyScheduler::launch(tokio::time::sleep);
    tokio::spawn(sched_service);

    // make data sharable
    let telegram_send_arc = Arc::new(telegram_send);

    let storage = SchedulerStorage {
        daily_verse_job_id: daily_verse::start(
            &options.verse_cron,
            &mut scheduler,
            content.clone(),
            telegram_send_arc.clone(),
        )?,
        event_reminder_job_id: event_reminder::start(
            &options.events_cron,
            &mut scheduler,
            content.clone(),
            telegram_send_arc.clone(),
        )?,
    };
    log::debug!("Scheduled jobs: {storage:?}");

    log::info!("Set up scheduler service");

    let mut open_tasks = Vec::new();
    let spawn_task = |command| {
        let (content_clone, telegram_send_clone) = (content.clone(), telegram_send_arc.clone());
        tokio::spawn(async move {
            if let Err(report) = controller::handle(command, content_clone, telegram_send_clone).await {
                log::error!(
                    "Error in handling SchedulerCommand.\n{}",
                    util::render_report(&report)
                );
            }
        })
    };
    // main control loop
    loop {
        tokio::select! {
            _ = subsys.on_shutdown_requested() => break,
            command_opt = sched_recv.recv() => match command_opt {
                Some(command) => open_tasks.push(spawn_task(command)),
                None => subsys.on_shutdown_requested().await,
            },
        }

        // clean open_tasks to prevent memory leakage
        open_tasks.retain(|handle| !handle.is_finished());
    }

    log::info!("Shutting down scheduler service...");
    scheduler.remove(storage.daily_verse_job_id);
    scheduler.remove(storage.event_reminder_job_id);

    // process pending control commands
    sched_recv.close();
    while let Some(command) = sched_recv.recv().await {
        open_tasks.push(spawn_task(command));
    }

    log::debug!("{} open task(s) in scheduler service", open_tasks.len());
    for handle in open_tasks {
        handle.await.into_diagnostic()?;
    }

    // there are no more references to the scheduler, so when this function terminates the scheduler gets terminated as well
    log::info!("Shut down scheduler service");
    Ok(())
}
