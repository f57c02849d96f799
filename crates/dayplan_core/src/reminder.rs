//! Reminder requests and the schedulers that deliver them.
//!
//! Stores never learn whether a reminder was delivered; scheduling is
//! fire-and-forget from their point of view.

use crate::error::AppError;
use crate::model::{Event, Todo};
use crate::notify::Notifier;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use time::{Duration, OffsetDateTime};

pub const DEFAULT_LEAD_MINUTES: u32 = 15;

const CANCEL_POLL: std::time::Duration = std::time::Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    Todo,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub entity_id: String,
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
    pub fire_at: OffsetDateTime,
}

impl Reminder {
    pub fn for_event(event: &Event, lead_minutes: u32) -> Self {
        let mut body = event.title.clone();
        if !event.description.is_empty() {
            body.push('\n');
            body.push_str(&event.description);
        }
        body.push_str(&format!("\n\nStarts in {lead_minutes} minutes"));

        Self {
            entity_id: event.id.clone(),
            kind: ReminderKind::Event,
            title: "Event reminder".to_string(),
            body,
            fire_at: event
                .due_date
                .checked_sub(Duration::minutes(i64::from(lead_minutes)))
                .unwrap_or(event.due_date),
        }
    }

    pub fn for_todo(todo: &Todo) -> Option<Self> {
        let fire_at = todo.reminder_time?;
        Some(Self {
            entity_id: todo.id.clone(),
            kind: ReminderKind::Todo,
            title: "Todo reminder".to_string(),
            body: todo.title.clone(),
            fire_at,
        })
    }
}

/// Reminders of open entities whose fire time lies in `(since, now]`, todos first.
pub fn due_reminders(
    todos: &[Todo],
    events: &[Event],
    since: OffsetDateTime,
    now: OffsetDateTime,
    lead_minutes: u32,
) -> Vec<Reminder> {
    let todo_reminders = todos
        .iter()
        .filter(|todo| !todo.completed)
        .filter_map(Reminder::for_todo);
    let event_reminders = events
        .iter()
        .filter(|event| !event.completed)
        .map(|event| Reminder::for_event(event, lead_minutes));

    todo_reminders
        .chain(event_reminders)
        .filter(|reminder| reminder.fire_at > since && reminder.fire_at <= now)
        .collect()
}

/// Reminders of open entities that have not fired yet at `now`.
pub fn upcoming_reminders(
    todos: &[Todo],
    events: &[Event],
    now: OffsetDateTime,
    lead_minutes: u32,
) -> Vec<Reminder> {
    let mut upcoming: Vec<Reminder> = todos
        .iter()
        .filter(|todo| !todo.completed)
        .filter_map(Reminder::for_todo)
        .chain(
            events
                .iter()
                .filter(|event| !event.completed)
                .map(|event| Reminder::for_event(event, lead_minutes)),
        )
        .filter(|reminder| reminder.fire_at > now)
        .collect();
    upcoming.sort_by_key(|reminder| reminder.fire_at);
    upcoming
}

pub trait ReminderScheduler {
    /// Queues `reminder`, replacing any pending reminder for the same entity.
    fn schedule(&self, reminder: Reminder) -> Result<(), AppError>;

    fn cancel(&self, entity_id: &str) -> Result<(), AppError>;

    fn cancel_all(&self) -> Result<(), AppError>;
}

pub struct NoopScheduler;

impl ReminderScheduler for NoopScheduler {
    fn schedule(&self, _reminder: Reminder) -> Result<(), AppError> {
        Ok(())
    }

    fn cancel(&self, _entity_id: &str) -> Result<(), AppError> {
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), AppError> {
        Ok(())
    }
}

struct Pending {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

type PendingMap = Arc<Mutex<HashMap<String, Pending>>>;

/// Delivers each reminder from its own sleeper thread.
pub struct ThreadScheduler<N> {
    notifier: Arc<N>,
    pending: PendingMap,
}

impl<N: Notifier + 'static> ThreadScheduler<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier: Arc::new(notifier),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Blocks until every reminder still queued has fired or been cancelled.
    pub fn wait(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = lock(&self.pending)
                .drain()
                .map(|(_, pending)| pending.handle)
                .collect();
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if handle.join().is_err() {
                    tracing::warn!("reminder thread panicked");
                }
            }
        }
    }
}

impl<N: Notifier + 'static> ReminderScheduler for ThreadScheduler<N> {
    fn schedule(&self, reminder: Reminder) -> Result<(), AppError> {
        let entity_id = reminder.entity_id.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let notifier = Arc::clone(&self.notifier);
        let pending = Arc::clone(&self.pending);
        let flag = Arc::clone(&cancelled);

        let mut guard = lock(&self.pending);
        if let Some(previous) = guard.remove(&entity_id) {
            previous.cancelled.store(true, Ordering::SeqCst);
        }

        let handle = std::thread::Builder::new()
            .name(format!("reminder-{entity_id}"))
            .spawn(move || {
                sleep_until(reminder.fire_at, &flag);
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                match notifier.notify(&reminder) {
                    Ok(()) => tracing::info!(entity_id = %reminder.entity_id, "reminder delivered"),
                    Err(err) => tracing::warn!(
                        entity_id = %reminder.entity_id,
                        error = %err,
                        "reminder delivery failed"
                    ),
                }
                let mut guard = lock(&pending);
                if guard
                    .get(&reminder.entity_id)
                    .is_some_and(|entry| Arc::ptr_eq(&entry.cancelled, &flag))
                {
                    guard.remove(&reminder.entity_id);
                }
            })?;

        guard.insert(entity_id, Pending { cancelled, handle });
        Ok(())
    }

    fn cancel(&self, entity_id: &str) -> Result<(), AppError> {
        if let Some(pending) = lock(&self.pending).remove(entity_id) {
            pending.cancelled.store(true, Ordering::SeqCst);
            tracing::debug!(entity_id, "reminder cancelled");
        }
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), AppError> {
        for (_, pending) in lock(&self.pending).drain() {
            pending.cancelled.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<String, Pending>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn sleep_until(fire_at: OffsetDateTime, cancelled: &AtomicBool) {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        let remaining = fire_at - OffsetDateTime::now_utc();
        if !remaining.is_positive() {
            return;
        }
        let remaining = std::time::Duration::try_from(remaining).unwrap_or(CANCEL_POLL);
        std::thread::sleep(remaining.min(CANCEL_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Reminder, ReminderKind, ReminderScheduler, ThreadScheduler, due_reminders,
        upcoming_reminders,
    };
    use crate::error::AppError;
    use crate::model::{Event, EventType, Todo};
    use crate::notify::Notifier;
    use std::sync::{Arc, Mutex};
    use time::macros::datetime;
    use time::{Date, Duration, OffsetDateTime};

    fn event(id: &str, description: &str, due_date: OffsetDateTime) -> Event {
        Event {
            id: id.to_string(),
            title: "Standup".to_string(),
            description: description.to_string(),
            kind: EventType::Routine,
            due_date,
            completed: false,
        }
    }

    fn todo(id: &str, reminder_time: Option<OffsetDateTime>) -> Todo {
        Todo {
            id: id.to_string(),
            title: "Buy milk".to_string(),
            completed: false,
            due_date: None,
            reminder_time,
        }
    }

    #[test]
    fn event_reminder_fires_lead_minutes_early() {
        let reminder = Reminder::for_event(
            &event("event-1", "Daily sync", datetime!(2024-01-02 09:00 UTC)),
            15,
        );

        assert_eq!(reminder.kind, ReminderKind::Event);
        assert_eq!(reminder.fire_at, datetime!(2024-01-02 08:45 UTC));
        assert_eq!(reminder.body, "Standup\nDaily sync\n\nStarts in 15 minutes");
    }

    #[test]
    fn event_at_start_of_calendar_fires_at_due_date() {
        let due = Date::MIN.midnight().assume_utc();
        let reminder = Reminder::for_event(&event("event-1", "", due), 15);

        assert_eq!(reminder.fire_at, due);
    }

    #[test]
    fn event_reminder_skips_empty_description() {
        let reminder = Reminder::for_event(&event("event-1", "", datetime!(2024-01-02 09:00 UTC)), 5);
        assert_eq!(reminder.body, "Standup\n\nStarts in 5 minutes");
    }

    #[test]
    fn todo_reminder_requires_reminder_time() {
        assert!(Reminder::for_todo(&todo("todo-1", None)).is_none());

        let at = datetime!(2024-01-02 07:00 UTC);
        let reminder = Reminder::for_todo(&todo("todo-1", Some(at))).unwrap();
        assert_eq!(reminder.fire_at, at);
        assert_eq!(reminder.body, "Buy milk");
    }

    #[test]
    fn due_reminders_selects_window_and_open_entities() {
        let now = datetime!(2024-01-02 08:50 UTC);
        let since = now - Duration::minutes(15);
        let mut done = event("event-done", "", datetime!(2024-01-02 09:00 UTC));
        done.completed = true;

        let todos = vec![
            todo("todo-due", Some(datetime!(2024-01-02 08:40 UTC))),
            todo("todo-old", Some(datetime!(2024-01-02 07:00 UTC))),
            todo("todo-later", Some(datetime!(2024-01-02 10:00 UTC))),
            todo("todo-none", None),
        ];
        let events = vec![
            event("event-due", "", datetime!(2024-01-02 09:00 UTC)),
            event("event-later", "", datetime!(2024-01-02 12:00 UTC)),
            done,
        ];

        let due = due_reminders(&todos, &events, since, now, 15);
        let ids: Vec<&str> = due.iter().map(|reminder| reminder.entity_id.as_str()).collect();

        assert_eq!(ids, ["todo-due", "event-due"]);
    }

    #[test]
    fn upcoming_reminders_are_sorted_by_fire_time() {
        let now = datetime!(2024-01-02 06:00 UTC);
        let todos = vec![todo("todo-1", Some(datetime!(2024-01-02 11:00 UTC)))];
        let events = vec![
            event("event-1", "", datetime!(2024-01-02 09:00 UTC)),
            event("event-past", "", datetime!(2024-01-02 05:00 UTC)),
        ];

        let upcoming = upcoming_reminders(&todos, &events, now, 15);
        let ids: Vec<&str> = upcoming.iter().map(|reminder| reminder.entity_id.as_str()).collect();

        assert_eq!(ids, ["event-1", "todo-1"]);
    }

    #[derive(Default, Clone)]
    struct RecordingNotifier {
        delivered: Arc<Mutex<Vec<String>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, reminder: &Reminder) -> Result<(), AppError> {
            self.delivered.lock().unwrap().push(reminder.entity_id.clone());
            Ok(())
        }
    }

    fn reminder_at(id: &str, fire_at: OffsetDateTime) -> Reminder {
        Reminder {
            entity_id: id.to_string(),
            kind: ReminderKind::Todo,
            title: "Todo reminder".to_string(),
            body: id.to_string(),
            fire_at,
        }
    }

    #[test]
    fn thread_scheduler_delivers_due_reminders() {
        let notifier = RecordingNotifier::default();
        let scheduler = ThreadScheduler::new(notifier.clone());

        scheduler
            .schedule(reminder_at("todo-1", OffsetDateTime::now_utc() - Duration::seconds(1)))
            .unwrap();
        scheduler.wait();

        assert_eq!(notifier.delivered.lock().unwrap().as_slice(), ["todo-1"]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn thread_scheduler_cancel_prevents_delivery() {
        let notifier = RecordingNotifier::default();
        let scheduler = ThreadScheduler::new(notifier.clone());

        scheduler
            .schedule(reminder_at("todo-1", OffsetDateTime::now_utc() + Duration::hours(1)))
            .unwrap();
        scheduler
            .schedule(reminder_at("todo-2", OffsetDateTime::now_utc() + Duration::hours(1)))
            .unwrap();
        assert_eq!(scheduler.pending_count(), 2);

        scheduler.cancel("todo-1").unwrap();
        scheduler.cancel_all().unwrap();
        scheduler.wait();

        assert!(notifier.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn thread_scheduler_replaces_reminder_for_same_entity() {
        let notifier = RecordingNotifier::default();
        let scheduler = ThreadScheduler::new(notifier.clone());

        scheduler
            .schedule(reminder_at("event-1", OffsetDateTime::now_utc() + Duration::hours(1)))
            .unwrap();
        scheduler
            .schedule(reminder_at("event-1", OffsetDateTime::now_utc() - Duration::seconds(1)))
            .unwrap();
        scheduler.wait();

        assert_eq!(notifier.delivered.lock().unwrap().as_slice(), ["event-1"]);
    }
}
