//! Transitions shared by every store: ordered collections keyed by a unique id.
//!
//! Each function takes the current items and returns the next items together
//! with an [`Outcome`]. When the outcome is [`Outcome::Ignored`] the returned
//! items equal the input.

use crate::model::{Event, Todo};

pub trait Entity: Clone {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn set_title(&mut self, title: String);
    fn completed_mut(&mut self) -> &mut bool;

    /// Trims display text in place. Returns false when the title is blank.
    fn normalize(&mut self) -> bool {
        let trimmed = self.title().trim();
        if trimmed.is_empty() {
            return false;
        }
        if trimmed.len() != self.title().len() {
            let trimmed = trimmed.to_string();
            self.set_title(trimmed);
        }
        true
    }
}

impl Entity for Todo {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn completed_mut(&mut self) -> &mut bool {
        &mut self.completed
    }
}

impl Entity for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn completed_mut(&mut self) -> &mut bool {
        &mut self.completed
    }

    fn normalize(&mut self) -> bool {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.title = trimmed.to_string();
        self.description = self.description.trim().to_string();
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored(Ignored),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    BlankTitle,
    NotFound,
    DuplicateId,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

pub fn contains<E: Entity>(items: &[E], id: &str) -> bool {
    items.iter().any(|item| item.id() == id)
}

pub fn insert<E: Entity>(items: &[E], mut entity: E) -> (Vec<E>, Outcome) {
    if !entity.normalize() {
        return (items.to_vec(), Outcome::Ignored(Ignored::BlankTitle));
    }
    if contains(items, entity.id()) {
        return (items.to_vec(), Outcome::Ignored(Ignored::DuplicateId));
    }

    let mut next = Vec::with_capacity(items.len() + 1);
    next.extend_from_slice(items);
    next.push(entity);
    (next, Outcome::Applied)
}

pub fn toggle<E: Entity>(items: &[E], id: &str) -> (Vec<E>, Outcome) {
    modify(items, id, |entity| {
        let completed = entity.completed_mut();
        *completed = !*completed;
    })
}

pub fn remove<E: Entity>(items: &[E], id: &str) -> (Vec<E>, Outcome) {
    if !contains(items, id) {
        return (items.to_vec(), Outcome::Ignored(Ignored::NotFound));
    }
    let next = items.iter().filter(|item| item.id() != id).cloned().collect();
    (next, Outcome::Applied)
}

/// Swaps in `entity` at the position of the item sharing its id.
pub fn replace<E: Entity>(items: &[E], mut entity: E) -> (Vec<E>, Outcome) {
    let Some(index) = items.iter().position(|item| item.id() == entity.id()) else {
        return (items.to_vec(), Outcome::Ignored(Ignored::NotFound));
    };
    if !entity.normalize() {
        return (items.to_vec(), Outcome::Ignored(Ignored::BlankTitle));
    }

    let mut next = items.to_vec();
    next[index] = entity;
    (next, Outcome::Applied)
}

pub fn modify<E, F>(items: &[E], id: &str, change: F) -> (Vec<E>, Outcome)
where
    E: Entity,
    F: FnOnce(&mut E),
{
    let mut next = items.to_vec();
    match next.iter_mut().find(|item| item.id() == id) {
        Some(item) => {
            change(item);
            (next, Outcome::Applied)
        }
        None => (next, Outcome::Ignored(Ignored::NotFound)),
    }
}
