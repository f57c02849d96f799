use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Job,
    Routine,
    FreeTime,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Job, EventType::Routine, EventType::FreeTime];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Routine => "routine",
            Self::FreeTime => "free-time",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "job" => Ok(Self::Job),
            "routine" => Ok(Self::Routine),
            "free-time" | "freetime" => Ok(Self::FreeTime),
            other => Err(AppError::invalid_input(format!(
                "unknown event type '{other}' (expected job, routine or free-time)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub kind: EventType,
    pub due_date: OffsetDateTime,
}

impl EventDraft {
    pub fn new<T: Into<String>>(title: T, kind: EventType, due_date: OffsetDateTime) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            kind,
            due_date,
        }
    }

    pub fn describe<D: Into<String>>(mut self, description: D) -> Self {
        self.description = description.into();
        self
    }

    pub(crate) fn into_event(self, id: String) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            kind: self.kind,
            due_date: self.due_date,
            completed: false,
        }
    }
}
