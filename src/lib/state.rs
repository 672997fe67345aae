//! This module store the type for the collective state of the application.
use crate::store::NoteStore;

/// The shared state for the application.
#[derive(Debug, Default)]
pub struct AppState {
    /// Every note known to this process.
    pub notes: NoteStore,
}

impl AppState {
    /// Creates a new [`AppState`] with an empty note store.
    pub fn new() -> Self {
        AppState {
            notes: NoteStore::new(),
        }
    }
}
