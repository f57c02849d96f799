use crate::id::{IdGenerator, SequentialIds};
use crate::model::{Todo, TodoDraft};
use crate::store::collection::{self, Ignored, Outcome};
use time::OffsetDateTime;

pub const TODO_ID_PREFIX: &str = "todo";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoState {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoAction {
    Create(Todo),
    Toggle(String),
    Delete(String),
    Update(Todo),
    SetReminder { id: String, time: OffsetDateTime },
}

pub fn reduce(state: &TodoState, action: TodoAction) -> (TodoState, Outcome) {
    let (todos, outcome) = match action {
        TodoAction::Create(todo) => collection::insert(&state.todos, todo),
        TodoAction::Toggle(id) => collection::toggle(&state.todos, &id),
        TodoAction::Delete(id) => collection::remove(&state.todos, &id),
        TodoAction::Update(todo) => collection::replace(&state.todos, todo),
        TodoAction::SetReminder { id, time } => collection::modify(&state.todos, &id, |todo| {
            todo.reminder_time = Some(time);
        }),
    };
    (TodoState { todos }, outcome)
}

#[derive(Debug, Clone)]
pub struct TodoStore<G = SequentialIds> {
    state: TodoState,
    ids: G,
}

impl TodoStore<SequentialIds> {
    pub fn new() -> Self {
        Self::with_ids(SequentialIds::new(TODO_ID_PREFIX))
    }

    /// Rehydrates a store, numbering new ids after the ones already present.
    pub fn from_todos(todos: Vec<Todo>) -> Self {
        let ids = SequentialIds::resume(TODO_ID_PREFIX, todos.iter().map(|todo| todo.id.as_str()));
        Self {
            state: TodoState { todos },
            ids,
        }
    }
}

impl Default for TodoStore<SequentialIds> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: IdGenerator> TodoStore<G> {
    pub fn with_ids(ids: G) -> Self {
        Self {
            state: TodoState::default(),
            ids,
        }
    }

    pub fn state(&self) -> &TodoState {
        &self.state
    }

    pub fn todos(&self) -> &[Todo] {
        &self.state.todos
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.state.todos.iter().find(|todo| todo.id == id)
    }

    pub fn into_todos(self) -> Vec<Todo> {
        self.state.todos
    }

    /// Applies `action` to the owned state. Crate-internal so that new ids
    /// only ever come from [`Self::create`].
    pub(crate) fn dispatch(&mut self, action: TodoAction) -> Outcome {
        let label = action_label(&action);
        let (next, outcome) = reduce(&self.state, action);
        match outcome {
            Outcome::Applied => {
                tracing::debug!(action = label, todos = next.todos.len(), "todo store updated");
                self.state = next;
            }
            Outcome::Ignored(reason) => {
                tracing::debug!(action = label, ?reason, "todo intent ignored");
            }
        }
        outcome
    }

    /// Appends a todo built from `draft`. Returns `None` when the title is blank.
    pub fn create(&mut self, draft: TodoDraft) -> Option<Todo> {
        if draft.title.trim().is_empty() {
            tracing::debug!(action = "create", reason = ?Ignored::BlankTitle, "todo intent ignored");
            return None;
        }

        let id = self.fresh_id();
        match self.dispatch(TodoAction::Create(draft.into_todo(id.clone()))) {
            Outcome::Applied => self.get(&id).cloned(),
            Outcome::Ignored(_) => None,
        }
    }

    pub fn toggle(&mut self, id: &str) -> Outcome {
        self.dispatch(TodoAction::Toggle(id.to_string()))
    }

    pub fn delete(&mut self, id: &str) -> Outcome {
        self.dispatch(TodoAction::Delete(id.to_string()))
    }

    pub fn update(&mut self, todo: Todo) -> Outcome {
        self.dispatch(TodoAction::Update(todo))
    }

    pub fn set_reminder(&mut self, id: &str, time: OffsetDateTime) -> Outcome {
        self.dispatch(TodoAction::SetReminder {
            id: id.to_string(),
            time,
        })
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = self.ids.next_id();
            if !collection::contains(&self.state.todos, &id) {
                return id;
            }
        }
    }
}

fn action_label(action: &TodoAction) -> &'static str {
    match action {
        TodoAction::Create(_) => "create",
        TodoAction::Toggle(_) => "toggle",
        TodoAction::Delete(_) => "delete",
        TodoAction::Update(_) => "update",
        TodoAction::SetReminder { .. } => "set_reminder",
    }
}
