use crate::error::AppError;
use crate::model::{Event, Todo};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "planner.json";
const STORE_ENV_VAR: &str = "DAYPLAN_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredPlanner {
    schema_version: u32,
    #[serde(default)]
    todos: Vec<Todo>,
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerState {
    pub todos: Vec<Todo>,
    pub events: Vec<Event>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    super::app_file(STORE_ENV_VAR, STORE_FILE_NAME)
}

pub fn load_state(path: &Path) -> Result<PlannerState, AppError> {
    if !path.exists() {
        return Ok(PlannerState::default());
    }

    let content = std::fs::read_to_string(path)?;
    let stored: StoredPlanner =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    ensure_unique_ids("todo", stored.todos.iter().map(|todo| todo.id.as_str()))?;
    ensure_unique_ids("event", stored.events.iter().map(|event| event.id.as_str()))?;

    Ok(PlannerState {
        todos: stored.todos,
        events: stored.events,
    })
}

fn ensure_unique_ids<'a, I: Iterator<Item = &'a str>>(kind: &str, ids: I) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(AppError::invalid_data(format!("duplicate {kind} id '{id}'")));
        }
    }
    Ok(())
}

pub fn save_state(path: &Path, state: &PlannerState) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let stored = StoredPlanner {
        schema_version: SCHEMA_VERSION,
        todos: state.todos.clone(),
        events: state.events.clone(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
    }

    tracing::debug!(
        path = %path.display(),
        todos = state.todos.len(),
        events = state.events.len(),
        "planner state saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{PlannerState, SCHEMA_VERSION, load_state, save_state};
    use crate::model::{Event, EventType, Todo};
    use std::fs;
    use time::macros::datetime;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("planner.json");
        let state = PlannerState {
            todos: vec![Todo {
                id: "todo-1".to_string(),
                title: "Buy milk".to_string(),
                completed: false,
                due_date: Some(datetime!(2024-01-02 18:00 +1)),
                reminder_time: None,
            }],
            events: vec![Event {
                id: "event-1".to_string(),
                title: "Standup".to_string(),
                description: "Daily sync".to_string(),
                kind: EventType::Routine,
                due_date: datetime!(2024-01-02 09:00 UTC),
                completed: true,
            }],
        };

        save_state(&path, &state).unwrap();
        let loaded = load_state(&path).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_state(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, PlannerState::default());
    }

    #[test]
    fn accepts_minimal_entities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.json");
        let content = r#"{
  "schema_version": 1,
  "todos": [ { "id": "todo-1", "title": "demo" } ],
  "events": [ { "id": "event-1", "title": "Hike", "type": "free-time", "due_date": "2024-01-03T10:00:00Z" } ]
}"#;
        fs::write(&path, content).unwrap();

        let loaded = load_state(&path).unwrap();

        assert!(!loaded.todos[0].completed);
        assert_eq!(loaded.todos[0].due_date, None);
        assert_eq!(loaded.todos[0].reminder_time, None);
        assert_eq!(loaded.events[0].description, "");
        assert_eq!(loaded.events[0].kind, EventType::FreeTime);
    }

    #[test]
    fn rejects_unknown_event_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad-type.json");
        let content = r#"{
  "schema_version": 1,
  "events": [ { "id": "event-1", "title": "Nap", "type": "leisure", "due_date": "2024-01-03T10:00:00Z" } ]
}"#;
        fs::write(&path, content).unwrap();

        assert_eq!(load_state(&path).unwrap_err().code(), "invalid_data");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupes.json");
        let content = r#"{
  "schema_version": 1,
  "todos": [ { "id": "todo-1", "title": "a" }, { "id": "todo-1", "title": "b" } ]
}"#;
        fs::write(&path, content).unwrap();

        let err = load_state(&path).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
        assert!(err.message().contains("todo-1"));
    }

    #[test]
    fn schema_version_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad-schema.json");
        let bad = format!(
            "{{\n  \"schema_version\": {},\n  \"todos\": []\n}}",
            SCHEMA_VERSION + 1
        );
        fs::write(&path, bad).unwrap();

        assert_eq!(load_state(&path).unwrap_err().code(), "invalid_data");
    }
}
