use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub reminder_time: Option<OffsetDateTime>,
}

/// Everything a caller supplies when creating a todo; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub completed: bool,
    pub due_date: Option<OffsetDateTime>,
    pub reminder_time: Option<OffsetDateTime>,
}

impl TodoDraft {
    pub fn new<T: Into<String>>(title: T) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn due(mut self, due_date: OffsetDateTime) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn remind_at(mut self, reminder_time: OffsetDateTime) -> Self {
        self.reminder_time = Some(reminder_time);
        self
    }

    pub(crate) fn into_todo(self, id: String) -> Todo {
        Todo {
            id,
            title: self.title,
            completed: self.completed,
            due_date: self.due_date,
            reminder_time: self.reminder_time,
        }
    }
}
