//! This module declares all types that may be used as response payloads.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Note;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl NoteResponse {
    pub fn new(id: String, note: Note) -> Self {
        Self {
            id,
            title: note.title,
            description: note.description,
            created_at: note.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
