use crate::model::{Event, EventType};
use std::collections::BTreeSet;
use time::{Date, UtcOffset};

/// The event types currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilter {
    selected: BTreeSet<EventType>,
}

impl TypeFilter {
    pub fn all() -> Self {
        Self::only(EventType::ALL)
    }

    pub fn none() -> Self {
        Self {
            selected: BTreeSet::new(),
        }
    }

    pub fn only<I: IntoIterator<Item = EventType>>(types: I) -> Self {
        Self {
            selected: types.into_iter().collect(),
        }
    }

    pub fn contains(&self, kind: EventType) -> bool {
        self.selected.contains(&kind)
    }

    /// Adds `kind` when absent, removes it when present.
    pub fn toggle(&mut self, kind: EventType) {
        if !self.selected.remove(&kind) {
            self.selected.insert(kind);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventType> + '_ {
        self.selected.iter().copied()
    }
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// False when the due date has no representation at `offset`.
pub fn falls_on(event: &Event, day: Date, offset: UtcOffset) -> bool {
    event
        .due_date
        .checked_to_offset(offset)
        .is_some_and(|local| local.date() == day)
}

/// Events due on `day` (calendar date at `offset`) whose type is selected, in input order.
pub fn events_on_day<'a>(
    events: &'a [Event],
    day: Date,
    offset: UtcOffset,
    types: &TypeFilter,
) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|event| falls_on(event, day, offset) && types.contains(event.kind))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub day: Date,
    pub events: Vec<Event>,
    pub remaining: usize,
}

pub fn day_view(events: &[Event], day: Date, offset: UtcOffset, types: &TypeFilter) -> DayView {
    let events: Vec<Event> = events_on_day(events, day, offset, types)
        .into_iter()
        .cloned()
        .collect();
    let remaining = events.iter().filter(|event| !event.completed).count();
    DayView {
        day,
        events,
        remaining,
    }
}
