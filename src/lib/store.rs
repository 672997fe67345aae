//! This module owns the in-memory collection of notes and the counter
//! used to name them.
use std::{collections::HashMap, sync::RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single note record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub title: String,
    pub description: String,
    /// Assigned by the store on creation and never changed afterwards.
    pub created_at: DateTime<Utc>,
}

/// An error type for failures inside the note store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Note store lock was poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct Inner {
    notes: HashMap<String, Note>,
    /// The last identifier handed out. Only ever increases.
    last_id: u64,
}

/// The process-wide owner of every note. Every operation holds the lock
/// for its whole read-modify-write sequence.
#[derive(Debug, Default)]
pub struct NoteStore {
    inner: RwLock<Inner>,
}

impl NoteStore {
    /// Creates a new, empty [`NoteStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all stored notes with their identifiers. The
    /// order of the entries is unspecified.
    pub fn list(&self) -> Result<Vec<(String, Note)>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;

        Ok(inner
            .notes
            .iter()
            .map(|(id, note)| (id.clone(), note.clone()))
            .collect())
    }

    /// Stores a new note under the next identifier and stamps it with the
    /// current time.
    pub fn create(
        &self,
        title: String,
        description: String,
    ) -> Result<(String, Note), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        inner.last_id += 1;

        let id = inner.last_id.to_string();
        let note = Note {
            title,
            description,
            created_at: Utc::now(),
        };

        inner.notes.insert(id.clone(), note.clone());

        Ok((id, note))
    }

    /// Replaces the title and description of an existing note. Returns
    /// `None` without touching the store when `id` is unknown.
    pub fn update(
        &self,
        id: &str,
        title: String,
        description: String,
    ) -> Result<Option<Note>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        Ok(inner.notes.get_mut(id).map(|note| {
            note.title = title;
            note.description = description;
            note.clone()
        }))
    }

    /// Removes a note, returning whether it was present.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        Ok(inner.notes.remove(id).is_some())
    }

    /// Poisons the lock by panicking while holding it.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let result = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = self.inner.write().unwrap();
                    panic!("poisoning the note store");
                })
                .join()
        });

        assert!(result.is_err());
        assert!(self.inner.is_poisoned());
    }
}
