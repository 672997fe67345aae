//! This module declares all types that may be used as request payloads.
use serde::{Deserialize, Serialize};

/// The body accepted when creating or replacing a note.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NoteRequest {
    pub title: String,
    pub description: String,
}
