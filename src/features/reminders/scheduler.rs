//! # Due-reminder poller
//!
//! Every tick scans the store for due reminders, delivers them one at a time,
//! and marks each sent once its DM went out. Failed deliveries stay unsent and
//! are retried on the next tick.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Explicit start/stop task object, single active-run guard, per-delivery timeout
//! - 1.0.0: Initial release with a fixed one-second polling loop

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};

use super::dispatcher::NotificationDispatcher;
use super::store::{due_or_empty, ReminderStore};
use crate::core::ReminderError;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Upper bound on a single delivery attempt
    pub attempt_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub due: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Another tick was still running, so this one did nothing
    pub skipped: bool,
}

pub struct ReminderScheduler {
    store: Arc<dyn ReminderStore>,
    dispatcher: NotificationDispatcher,
    config: SchedulerConfig,
    running: AtomicBool,
}

/// Clears the active-run flag when a tick ends, even on panic
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        dispatcher: NotificationDispatcher,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Run one tick against the current time
    pub async fn tick(&self) -> TickSummary {
        self.tick_at(Utc::now()).await
    }

    /// Run one tick treating `now` as the current time
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickSummary {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Previous reminder tick still running, skipping");
            return TickSummary {
                skipped: true,
                ..Default::default()
            };
        }
        let _guard = RunGuard(&self.running);

        let due = due_or_empty(self.store.as_ref(), None, now).await;
        let mut summary = TickSummary {
            due: due.len(),
            ..Default::default()
        };

        for reminder in due {
            match self.attempt(&reminder.owner, &reminder.message).await {
                Ok(()) => {
                    summary.delivered += 1;
                    info!(
                        "⏰ Delivered reminder {} (#{} for user {})",
                        reminder.id, reminder.list_id, reminder.owner
                    );
                    if let Err(e) = self.store.mark_sent(reminder.id).await {
                        // Left unsent, so the next tick delivers it again
                        error!("Failed to mark reminder {} as sent: {e}", reminder.id);
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        "Reminder {} for user {} not delivered, retrying next tick: {e}",
                        reminder.id, reminder.owner
                    );
                }
            }
        }

        if summary.due > 0 {
            debug!(
                "Reminder tick: {} due, {} delivered, {} failed",
                summary.due, summary.delivered, summary.failed
            );
        }
        summary
    }

    async fn attempt(&self, owner: &str, message: &str) -> Result<(), ReminderError> {
        match timeout(self.config.attempt_timeout, self.dispatcher.deliver(owner, message)).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(ReminderError::DeliveryFailed {
                owner: owner.to_string(),
                reason: format!(
                    "timed out after {} seconds",
                    self.config.attempt_timeout.as_secs_f32()
                ),
            }),
        }
    }

    /// Spawn the recurring poll loop
    ///
    /// Ticks run inline in the loop, so one tick finishes before the next
    /// starts; ticks missed while a slow one ran are dropped.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval = self.config.interval;

        let task = tokio::spawn(async move {
            info!("⏰ Reminder scheduler started (every {interval:?})");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Reminder scheduler stopped");
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Owner of a running scheduler loop
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for the in-flight tick to finish
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Reminder scheduler task ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::features::reminders::dispatcher::testing::{FakeChat, FakePush};
    use crate::features::reminders::dispatcher::{ChatPlatform, Recipient};
    use crate::features::reminders::model::NewReminder;
    use crate::features::reminders::store::testing::FailingStore;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    async fn setup(chat: Arc<FakeChat>) -> (Arc<Database>, ReminderScheduler) {
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        let scheduler = ReminderScheduler::new(
            db.clone(),
            NotificationDispatcher::new(chat),
            SchedulerConfig::default(),
        );
        (db, scheduler)
    }

    #[tokio::test]
    async fn test_due_reminder_delivered_and_marked_sent() {
        let chat = Arc::new(FakeChat::default());
        let (db, scheduler) = setup(chat.clone()).await;
        let now = Utc::now();
        let created = db
            .create(NewReminder::new("U1", "drink water", now - ChronoDuration::seconds(1)))
            .await
            .unwrap();

        let summary = scheduler.tick_at(now).await;

        assert_eq!(summary.due, 1);
        assert_eq!(summary.delivered, 1);
        assert_eq!(
            chat.sent(),
            vec![("U1".to_string(), "⏰ Reminder: drink water".to_string())]
        );
        assert!(db.load_due(None, now).await.unwrap().is_empty());
        assert!(db.get_reminder(created.id).await.unwrap().unwrap().sent);

        // Next tick delivers nothing new
        let summary = scheduler.tick_at(now).await;
        assert_eq!(summary.due, 0);
        assert_eq!(chat.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_future_reminder_waits_for_its_time() {
        let chat = Arc::new(FakeChat::default());
        let (db, scheduler) = setup(chat.clone()).await;
        let now = Utc::now();
        db.create(NewReminder::new("U1", "stand up", now + ChronoDuration::hours(1)))
            .await
            .unwrap();

        assert_eq!(scheduler.tick_at(now).await.due, 0);
        assert!(chat.sent().is_empty());

        let later = now + ChronoDuration::hours(1) + ChronoDuration::seconds(1);
        let summary = scheduler.tick_at(later).await;
        assert_eq!(summary.delivered, 1);
        assert_eq!(chat.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_recipient_retried_next_tick() {
        let chat = Arc::new(FakeChat::with_unknown("U1"));
        let (db, scheduler) = setup(chat.clone()).await;
        let now = Utc::now();
        let created = db
            .create(NewReminder::new("U1", "drink water", now - ChronoDuration::seconds(1)))
            .await
            .unwrap();

        let first = scheduler.tick_at(now).await;
        assert_eq!(first.failed, 1);
        assert_eq!(first.delivered, 0);

        let still_due = db.load_due(None, now).await.unwrap();
        assert_eq!(still_due, vec![created.clone()]);

        let second = scheduler.tick_at(now).await;
        assert_eq!(second.due, 1);
        assert_eq!(second.failed, 1);
        assert_eq!(*chat.resolve_calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let chat = Arc::new(FakeChat::with_failing_dm("U1"));
        let (db, scheduler) = setup(chat.clone()).await;
        let now = Utc::now();
        db.create(NewReminder::new("U1", "first", now - ChronoDuration::seconds(2)))
            .await
            .unwrap();
        db.create(NewReminder::new("U2", "second", now - ChronoDuration::seconds(1)))
            .await
            .unwrap();

        let summary = scheduler.tick_at(now).await;

        assert_eq!(summary.due, 2);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 1);
        let remaining = db.load_due(None, now).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].owner, "U1");
    }

    #[tokio::test]
    async fn test_push_failure_still_marks_sent() {
        let chat = Arc::new(FakeChat::default());
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        let push = Arc::new(FakePush {
            fail: true,
            ..Default::default()
        });
        let scheduler = ReminderScheduler::new(
            db.clone(),
            NotificationDispatcher::new(chat.clone()).with_push(push, "reminder_system"),
            SchedulerConfig::default(),
        );
        let now = Utc::now();
        db.create(NewReminder::new("U1", "drink water", now - ChronoDuration::seconds(1)))
            .await
            .unwrap();

        let summary = scheduler.tick_at(now).await;

        assert_eq!(summary.delivered, 1);
        assert!(db.load_due(None, now).await.unwrap().is_empty());
    }

    /// A chat platform whose DMs never complete
    struct StalledChat;

    #[async_trait]
    impl ChatPlatform for StalledChat {
        async fn resolve_user(&self, owner: &str) -> Result<Recipient, ReminderError> {
            Ok(Recipient {
                id: 1,
                name: owner.to_string(),
            })
        }

        async fn send_direct_message(&self, _: &Recipient, _: &str) -> Result<(), ReminderError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_delivery_times_out_and_stays_unsent() {
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        let scheduler = ReminderScheduler::new(
            db.clone(),
            NotificationDispatcher::new(Arc::new(StalledChat)),
            SchedulerConfig {
                interval: Duration::from_secs(1),
                attempt_timeout: Duration::from_millis(50),
            },
        );
        let now = Utc::now();
        db.create(NewReminder::new("U1", "drink water", now - ChronoDuration::seconds(1)))
            .await
            .unwrap();

        let summary = scheduler.tick_at(now).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(db.load_due(None, now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let chat = Arc::new(FakeChat::default());
        let (_db, scheduler) = setup(chat).await;

        scheduler.running.store(true, Ordering::Release);
        let summary = scheduler.tick_at(Utc::now()).await;
        assert!(summary.skipped);

        scheduler.running.store(false, Ordering::Release);
        assert!(!scheduler.tick_at(Utc::now()).await.skipped);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let chat = Arc::new(FakeChat::default());
        let db = Arc::new(Database::new(":memory:").await.unwrap());
        db.create(NewReminder::new(
            "U1",
            "drink water",
            Utc::now() - ChronoDuration::seconds(1),
        ))
        .await
        .unwrap();

        let scheduler = Arc::new(ReminderScheduler::new(
            db.clone(),
            NotificationDispatcher::new(chat.clone()),
            SchedulerConfig {
                interval: Duration::from_millis(20),
                attempt_timeout: Duration::from_secs(1),
            },
        ));
        let handle = scheduler.start();

        // The first interval tick fires immediately
        for _ in 0..50 {
            if !chat.sent().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.stop().await;

        assert_eq!(chat.sent().len(), 1);
        assert!(db.load_due(None, Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_yields_empty_tick() {
        let chat = Arc::new(FakeChat::default());
        let store = Arc::new(FailingStore::new().await);
        let scheduler = ReminderScheduler::new(
            store.clone(),
            NotificationDispatcher::new(chat.clone()),
            SchedulerConfig::default(),
        );
        let now = Utc::now();
        store
            .create(NewReminder::new("U1", "drink water", now - ChronoDuration::seconds(1)))
            .await
            .unwrap();

        store.set_fail_reads(true);
        let summary = scheduler.tick_at(now).await;
        assert_eq!(summary, TickSummary::default());
        assert!(chat.sent().is_empty());

        store.set_fail_reads(false);
        assert_eq!(scheduler.tick_at(now).await.delivered, 1);
    }

    #[tokio::test]
    async fn test_mark_sent_failure_keeps_batch_going() {
        let chat = Arc::new(FakeChat::default());
        let store = Arc::new(FailingStore::new().await);
        let scheduler = ReminderScheduler::new(
            store.clone(),
            NotificationDispatcher::new(chat.clone()),
            SchedulerConfig::default(),
        );
        let now = Utc::now();
        for owner in ["U1", "U2"] {
            store
                .create(NewReminder::new(owner, "drink water", now - ChronoDuration::seconds(1)))
                .await
                .unwrap();
        }

        store.set_fail_mark_sent(true);
        let summary = scheduler.tick_at(now).await;
        assert_eq!(summary.due, 2);
        assert_eq!(summary.delivered, 2);
        assert_eq!(chat.sent().len(), 2);
        // Still unsent, so the next tick picks them up again
        assert_eq!(store.load_due(None, now).await.unwrap().len(), 2);

        store.set_fail_mark_sent(false);
        let summary = scheduler.tick_at(now).await;
        assert_eq!(summary.delivered, 2);
        assert_eq!(chat.sent().len(), 4);
        assert!(store.load_due(None, now).await.unwrap().is_empty());
    }
}
