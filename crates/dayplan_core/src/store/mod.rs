pub mod collection;
pub mod event;
pub mod todo;

pub use collection::{Entity, Ignored, Outcome};
pub use event::{EventAction, EventState, EventStore};
pub use todo::{TodoAction, TodoState, TodoStore};
