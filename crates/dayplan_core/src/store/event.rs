use crate::id::{IdGenerator, SequentialIds};
use crate::model::{Event, EventDraft};
use crate::store::collection::{self, Ignored, Outcome};

pub const EVENT_ID_PREFIX: &str = "event";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventState {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Create(Event),
    Toggle(String),
    Delete(String),
    Update(Event),
}

pub fn reduce(state: &EventState, action: EventAction) -> (EventState, Outcome) {
    let (events, outcome) = match action {
        EventAction::Create(event) => collection::insert(&state.events, event),
        EventAction::Toggle(id) => collection::toggle(&state.events, &id),
        EventAction::Delete(id) => collection::remove(&state.events, &id),
        EventAction::Update(event) => collection::replace(&state.events, event),
    };
    (EventState { events }, outcome)
}

#[derive(Debug, Clone)]
pub struct EventStore<G = SequentialIds> {
    state: EventState,
    ids: G,
}

impl EventStore<SequentialIds> {
    pub fn new() -> Self {
        Self::with_ids(SequentialIds::new(EVENT_ID_PREFIX))
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        let ids = SequentialIds::resume(
            EVENT_ID_PREFIX,
            events.iter().map(|event| event.id.as_str()),
        );
        Self {
            state: EventState { events },
            ids,
        }
    }
}

impl Default for EventStore<SequentialIds> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: IdGenerator> EventStore<G> {
    pub fn with_ids(ids: G) -> Self {
        Self {
            state: EventState::default(),
            ids,
        }
    }

    pub fn state(&self) -> &EventState {
        &self.state
    }

    pub fn events(&self) -> &[Event] {
        &self.state.events
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.state.events.iter().find(|event| event.id == id)
    }

    pub fn into_events(self) -> Vec<Event> {
        self.state.events
    }

    /// Applies `action` to the owned state. Crate-internal so that new ids
    /// only ever come from [`Self::create`].
    pub(crate) fn dispatch(&mut self, action: EventAction) -> Outcome {
        let label = match &action {
            EventAction::Create(_) => "create",
            EventAction::Toggle(_) => "toggle",
            EventAction::Delete(_) => "delete",
            EventAction::Update(_) => "update",
        };
        let (next, outcome) = reduce(&self.state, action);
        match outcome {
            Outcome::Applied => {
                tracing::debug!(action = label, events = next.events.len(), "event store updated");
                self.state = next;
            }
            Outcome::Ignored(reason) => {
                tracing::debug!(action = label, ?reason, "event intent ignored");
            }
        }
        outcome
    }

    /// Appends an event built from `draft`, not completed. Returns `None` when
    /// the title is blank.
    pub fn create(&mut self, draft: EventDraft) -> Option<Event> {
        if draft.title.trim().is_empty() {
            tracing::debug!(action = "create", reason = ?Ignored::BlankTitle, "event intent ignored");
            return None;
        }

        let id = loop {
            let candidate = self.ids.next_id();
            if !collection::contains(&self.state.events, &candidate) {
                break candidate;
            }
        };

        match self.dispatch(EventAction::Create(draft.into_event(id.clone()))) {
            Outcome::Applied => self.get(&id).cloned(),
            Outcome::Ignored(_) => None,
        }
    }

    pub fn toggle(&mut self, id: &str) -> Outcome {
        self.dispatch(EventAction::Toggle(id.to_string()))
    }

    pub fn delete(&mut self, id: &str) -> Outcome {
        self.dispatch(EventAction::Delete(id.to_string()))
    }

    pub fn update(&mut self, event: Event) -> Outcome {
        self.dispatch(EventAction::Update(event))
    }
}
