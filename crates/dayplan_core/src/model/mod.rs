mod event;
mod todo;

pub use event::{Event, EventDraft, EventType};
pub use todo::{Todo, TodoDraft};
