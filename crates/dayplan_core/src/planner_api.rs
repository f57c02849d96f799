use crate::error::AppError;
use crate::filter::{DayView, TypeFilter, day_view as build_day_view};
use crate::model::{Event, EventDraft, EventType, Todo, TodoDraft};
use crate::notify::Notifier;
use crate::reminder::{Reminder, ReminderScheduler, due_reminders, upcoming_reminders};
use crate::storage::json_store::{self, PlannerState};
use crate::store::{EventStore, Ignored, Outcome, TodoStore};
use std::path::Path;
use time::{Date, OffsetDateTime, UtcOffset};

/// Where reminder requests go after a successful mutation.
#[derive(Clone, Copy)]
pub struct Reminders<'a> {
    pub scheduler: &'a dyn ReminderScheduler,
    pub lead_minutes: u32,
}

impl Reminders<'_> {
    fn schedule(&self, reminder: Reminder) {
        let entity_id = reminder.entity_id.clone();
        if let Err(err) = self.scheduler.schedule(reminder) {
            tracing::warn!(entity_id = %entity_id, error = %err, "failed to schedule reminder");
        }
    }

    fn cancel(&self, entity_id: &str) {
        if let Err(err) = self.scheduler.cancel(entity_id) {
            tracing::warn!(entity_id, error = %err, "failed to cancel reminder");
        }
    }

    fn sync_todo(&self, todo: &Todo) {
        match Reminder::for_todo(todo) {
            Some(reminder) if !todo.completed => self.schedule(reminder),
            _ => self.cancel(&todo.id),
        }
    }

    fn sync_event(&self, event: &Event) {
        if event.completed {
            self.cancel(&event.id);
        } else {
            self.schedule(Reminder::for_event(event, self.lead_minutes));
        }
    }
}

/// Field changes for an edit; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoEdit {
    pub title: Option<String>,
    pub due_date: Option<Option<OffsetDateTime>>,
    pub reminder_time: Option<Option<OffsetDateTime>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<EventType>,
    pub due_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Todo(Todo),
    Event(Event),
}

#[derive(Debug)]
pub struct NotificationOutcome {
    pub delivered: Vec<Reminder>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub entity_id: String,
    pub error: AppError,
}

pub fn add_todo(draft: TodoDraft, reminders: Reminders<'_>) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    add_todo_with_path(&path, draft, reminders)
}

pub fn toggle_todo(id: &str, reminders: Reminders<'_>) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    toggle_todo_with_path(&path, id, reminders)
}

pub fn edit_todo(id: &str, edit: TodoEdit, reminders: Reminders<'_>) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    edit_todo_with_path(&path, id, edit, reminders)
}

pub fn delete_todo(id: &str, reminders: Reminders<'_>) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    delete_todo_with_path(&path, id, reminders)
}

pub fn set_todo_reminder(
    id: &str,
    time: OffsetDateTime,
    reminders: Reminders<'_>,
) -> Result<Todo, AppError> {
    let path = json_store::store_path()?;
    set_todo_reminder_with_path(&path, id, time, reminders)
}

pub fn list_todos() -> Result<Vec<Todo>, AppError> {
    let path = json_store::store_path()?;
    Ok(json_store::load_state(&path)?.todos)
}

pub fn add_event(draft: EventDraft, reminders: Reminders<'_>) -> Result<Event, AppError> {
    let path = json_store::store_path()?;
    add_event_with_path(&path, draft, reminders)
}

pub fn toggle_event(id: &str, reminders: Reminders<'_>) -> Result<Event, AppError> {
    let path = json_store::store_path()?;
    toggle_event_with_path(&path, id, reminders)
}

pub fn edit_event(id: &str, edit: EventEdit, reminders: Reminders<'_>) -> Result<Event, AppError> {
    let path = json_store::store_path()?;
    edit_event_with_path(&path, id, edit, reminders)
}

pub fn delete_event(id: &str, reminders: Reminders<'_>) -> Result<Event, AppError> {
    let path = json_store::store_path()?;
    delete_event_with_path(&path, id, reminders)
}

pub fn day_view(day: Date, offset: UtcOffset, types: &TypeFilter) -> Result<DayView, AppError> {
    let path = json_store::store_path()?;
    day_view_with_path(&path, day, offset, types)
}

pub fn find_entity(id: &str) -> Result<Entry, AppError> {
    let path = json_store::store_path()?;
    find_entity_with_path(&path, id)
}

pub fn notify_due(
    notifier: &dyn Notifier,
    since: OffsetDateTime,
    now: OffsetDateTime,
    lead_minutes: u32,
) -> Result<NotificationOutcome, AppError> {
    let path = json_store::store_path()?;
    notify_due_with_path(&path, notifier, since, now, lead_minutes)
}

pub fn upcoming(now: OffsetDateTime, lead_minutes: u32) -> Result<Vec<Reminder>, AppError> {
    let path = json_store::store_path()?;
    let state = json_store::load_state(&path)?;
    Ok(upcoming_reminders(&state.todos, &state.events, now, lead_minutes))
}

fn trimmed_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn require_applied(outcome: Outcome, kind: &str, id: &str) -> Result<(), AppError> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::Ignored(Ignored::BlankTitle) => Err(AppError::invalid_input("title is required")),
        Outcome::Ignored(Ignored::NotFound) => {
            Err(AppError::not_found(format!("{kind} '{id}' not found")))
        }
        Outcome::Ignored(Ignored::DuplicateId) => {
            Err(AppError::invalid_data(format!("{kind} id '{id}' already exists")))
        }
    }
}

fn split_state(state: PlannerState) -> (TodoStore, EventStore) {
    (
        TodoStore::from_todos(state.todos),
        EventStore::from_events(state.events),
    )
}

fn save_stores(path: &Path, todos: TodoStore, events: EventStore) -> Result<(), AppError> {
    let state = PlannerState {
        todos: todos.into_todos(),
        events: events.into_events(),
    };
    json_store::save_state(path, &state)
}

fn mutate_todos<F>(path: &Path, id: &str, apply: F) -> Result<Todo, AppError>
where
    F: FnOnce(&mut TodoStore, &str) -> Result<Outcome, AppError>,
{
    let id = trimmed_id(id)?;
    let (mut todos, events) = split_state(json_store::load_state(path)?);
    let outcome = apply(&mut todos, id)?;
    require_applied(outcome, "todo", id)?;
    let todo = todos
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("todo '{id}' not found")))?;
    save_stores(path, todos, events)?;
    Ok(todo)
}

fn mutate_events<F>(path: &Path, id: &str, apply: F) -> Result<Event, AppError>
where
    F: FnOnce(&mut EventStore, &str) -> Result<Outcome, AppError>,
{
    let id = trimmed_id(id)?;
    let (todos, mut events) = split_state(json_store::load_state(path)?);
    let outcome = apply(&mut events, id)?;
    require_applied(outcome, "event", id)?;
    let event = events
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("event '{id}' not found")))?;
    save_stores(path, todos, events)?;
    Ok(event)
}

fn add_todo_with_path(
    path: &Path,
    draft: TodoDraft,
    reminders: Reminders<'_>,
) -> Result<Todo, AppError> {
    let (mut todos, events) = split_state(json_store::load_state(path)?);
    let todo = todos
        .create(draft)
        .ok_or_else(|| AppError::invalid_input("title is required"))?;
    save_stores(path, todos, events)?;

    reminders.sync_todo(&todo);
    tracing::info!(id = %todo.id, "todo added");
    Ok(todo)
}

fn toggle_todo_with_path(path: &Path, id: &str, reminders: Reminders<'_>) -> Result<Todo, AppError> {
    let todo = mutate_todos(path, id, |store, id| Ok(store.toggle(id)))?;
    reminders.sync_todo(&todo);
    Ok(todo)
}

fn edit_todo_with_path(
    path: &Path,
    id: &str,
    edit: TodoEdit,
    reminders: Reminders<'_>,
) -> Result<Todo, AppError> {
    let todo = mutate_todos(path, id, |store, id| {
        let mut todo = store
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("todo '{id}' not found")))?;
        if let Some(title) = edit.title {
            todo.title = title;
        }
        if let Some(due_date) = edit.due_date {
            todo.due_date = due_date;
        }
        if let Some(reminder_time) = edit.reminder_time {
            todo.reminder_time = reminder_time;
        }
        Ok(store.update(todo))
    })?;
    reminders.sync_todo(&todo);
    Ok(todo)
}

fn delete_todo_with_path(path: &Path, id: &str, reminders: Reminders<'_>) -> Result<Todo, AppError> {
    let id = trimmed_id(id)?;
    let (mut todos, events) = split_state(json_store::load_state(path)?);
    let removed = todos
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("todo '{id}' not found")))?;
    require_applied(todos.delete(id), "todo", id)?;
    save_stores(path, todos, events)?;

    reminders.cancel(id);
    Ok(removed)
}

fn set_todo_reminder_with_path(
    path: &Path,
    id: &str,
    time: OffsetDateTime,
    reminders: Reminders<'_>,
) -> Result<Todo, AppError> {
    let todo = mutate_todos(path, id, |store, id| Ok(store.set_reminder(id, time)))?;
    reminders.sync_todo(&todo);
    Ok(todo)
}

fn add_event_with_path(
    path: &Path,
    draft: EventDraft,
    reminders: Reminders<'_>,
) -> Result<Event, AppError> {
    let (todos, mut events) = split_state(json_store::load_state(path)?);
    let event = events
        .create(draft)
        .ok_or_else(|| AppError::invalid_input("title is required"))?;
    save_stores(path, todos, events)?;

    reminders.sync_event(&event);
    tracing::info!(id = %event.id, kind = %event.kind, "event added");
    Ok(event)
}

fn toggle_event_with_path(
    path: &Path,
    id: &str,
    reminders: Reminders<'_>,
) -> Result<Event, AppError> {
    let event = mutate_events(path, id, |store, id| Ok(store.toggle(id)))?;
    reminders.sync_event(&event);
    Ok(event)
}

fn edit_event_with_path(
    path: &Path,
    id: &str,
    edit: EventEdit,
    reminders: Reminders<'_>,
) -> Result<Event, AppError> {
    let event = mutate_events(path, id, |store, id| {
        let mut event = store
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("event '{id}' not found")))?;
        if let Some(title) = edit.title {
            event.title = title;
        }
        if let Some(description) = edit.description {
            event.description = description;
        }
        if let Some(kind) = edit.kind {
            event.kind = kind;
        }
        if let Some(due_date) = edit.due_date {
            event.due_date = due_date;
        }
        Ok(store.update(event))
    })?;
    reminders.sync_event(&event);
    Ok(event)
}

fn delete_event_with_path(
    path: &Path,
    id: &str,
    reminders: Reminders<'_>,
) -> Result<Event, AppError> {
    let id = trimmed_id(id)?;
    let (todos, mut events) = split_state(json_store::load_state(path)?);
    let removed = events
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("event '{id}' not found")))?;
    require_applied(events.delete(id), "event", id)?;
    save_stores(path, todos, events)?;

    reminders.cancel(id);
    Ok(removed)
}

fn day_view_with_path(
    path: &Path,
    day: Date,
    offset: UtcOffset,
    types: &TypeFilter,
) -> Result<DayView, AppError> {
    let state = json_store::load_state(path)?;
    Ok(build_day_view(&state.events, day, offset, types))
}

fn find_entity_with_path(path: &Path, id: &str) -> Result<Entry, AppError> {
    let id = trimmed_id(id)?;
    let state = json_store::load_state(path)?;

    if let Some(todo) = state.todos.into_iter().find(|todo| todo.id == id) {
        return Ok(Entry::Todo(todo));
    }
    state
        .events
        .into_iter()
        .find(|event| event.id == id)
        .map(Entry::Event)
        .ok_or_else(|| AppError::not_found(format!("no todo or event with id '{id}'")))
}

fn notify_due_with_path(
    path: &Path,
    notifier: &dyn Notifier,
    since: OffsetDateTime,
    now: OffsetDateTime,
    lead_minutes: u32,
) -> Result<NotificationOutcome, AppError> {
    let state = json_store::load_state(path)?;
    let mut delivered = Vec::new();
    let mut failures = Vec::new();

    for reminder in due_reminders(&state.todos, &state.events, since, now, lead_minutes) {
        match notifier.notify(&reminder) {
            Ok(()) => delivered.push(reminder),
            Err(err) => {
                tracing::warn!(entity_id = %reminder.entity_id, error = %err, "notification failed");
                failures.push(NotificationFailure {
                    entity_id: reminder.entity_id,
                    error: err,
                });
            }
        }
    }

    Ok(NotificationOutcome {
        delivered,
        failures,
    })
}
