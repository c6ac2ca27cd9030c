//! Concurrency-safe, in-memory entity store.
//!
//! [`Store`] owns a mapping from identifier to [`Entity`] behind a
//! readers-writer lock. Any number of readers proceed together; a writer
//! excludes everyone else for the duration of a single map insertion. Callers
//! never see the map itself, only copies handed out by the accessors, so a
//! reader observes a writer's effect either completely or not at all.
//!
//! The store is volatile. It lives for the lifetime of the process and is
//! usually shared behind an [`Arc`](std::sync::Arc).

use crate::entity::{Entity, NewEntity};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Store {
    entities: RwLock<HashMap<String, Entity>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a single entity by identifier.
    ///
    /// A missing key is a negative result, never an error.
    pub fn get(&self, id: &str) -> Option<Entity> {
        self.entities.read().get(id).cloned()
    }

    /// Returns a point-in-time snapshot of every entity.
    ///
    /// The returned vector is a copy; inserts that happen after the read lock
    /// is released are not reflected. Order is unspecified.
    pub fn list(&self) -> Vec<Entity> {
        self.entities.read().values().cloned().collect()
    }

    /// Stamps `new` with the current time and inserts it, replacing any entity
    /// previously stored under the same identifier (last write wins).
    ///
    /// Returns the stored record.
    pub fn create(&self, new: NewEntity) -> Entity {
        // Keep the clock read outside the critical section.
        let entity = Entity::stamped(new, Utc::now());
        let stored = entity.clone();

        let replaced = self
            .entities
            .write()
            .insert(entity.id.clone(), entity)
            .is_some();

        tracing::trace!(id = %stored.id, replaced, "Stored entity");
        stored
    }

    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}
