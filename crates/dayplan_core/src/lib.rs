pub mod config;
pub mod error;
pub mod filter;
pub mod gesture;
pub mod id;
pub mod model;
pub mod notify;
pub mod planner_api;
pub mod reminder;
pub mod storage;
pub mod store;
pub mod timefmt;

#[cfg(test)]
mod tests {
    use crate::filter::{TypeFilter, events_on_day};
    use crate::model::{EventDraft, EventType, TodoDraft};
    use crate::store::{EventStore, TodoStore};
    use time::UtcOffset;
    use time::macros::{date, datetime};

    #[test]
    fn todo_and_event_stores_are_independent() {
        let mut todos = TodoStore::new();
        let mut events = EventStore::new();

        let todo = todos.create(TodoDraft::new("Buy milk")).unwrap();
        let event = events
            .create(EventDraft::new("Standup", EventType::Routine, datetime!(2024-01-02 09:00 UTC)))
            .unwrap();

        assert_eq!(todo.id, "todo-1");
        assert_eq!(event.id, "event-1");
        assert!(!events.toggle(&todo.id).is_applied());
        assert!(!todos.delete(&event.id).is_applied());
    }

    #[test]
    fn standup_and_hike_day_filter() {
        let mut events = EventStore::new();
        events
            .create(
                EventDraft::new("Standup", EventType::Routine, datetime!(2024-01-02 09:00 UTC))
                    .describe("Daily sync"),
            )
            .unwrap();
        events
            .create(EventDraft::new("Hike", EventType::FreeTime, datetime!(2024-01-03 10:00 UTC)))
            .unwrap();

        let picked = events_on_day(
            events.events(),
            date!(2024-01-02),
            UtcOffset::UTC,
            &TypeFilter::only([EventType::Routine, EventType::Job]),
        );

        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title, "Standup");
        assert_eq!(picked[0].description, "Daily sync");
    }
}
