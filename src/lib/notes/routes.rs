//! This module includes all routes used for managing notes.
use std::sync::Arc;

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{debug, error, instrument, warn};

use crate::{state::AppState, store::StoreError};

use super::{request::NoteRequest, response::NoteResponse, NoteError, NoteJson};

fn store_failed(err: StoreError) -> NoteError {
    error!("note store operation failed: {:?}", err);
    NoteError::OperationFailed
}

/// Lists every stored note.
#[instrument(skip(state))]
pub async fn list_notes(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<NoteResponse>>, NoteError> {
    let notes = state.notes.list().map_err(store_failed)?;

    debug!("listing {} notes", notes.len());

    Ok(Json(
        notes
            .into_iter()
            .map(|(id, note)| NoteResponse::new(id, note))
            .collect(),
    ))
}

/// Stores a new note and returns it along with its identifier.
#[instrument(skip(state, payload))]
pub async fn create_note(
    Extension(state): Extension<Arc<AppState>>,
    NoteJson(payload): NoteJson<NoteRequest>,
) -> Result<Response, NoteError> {
    let (id, note) = state
        .notes
        .create(payload.title, payload.description)
        .map_err(store_failed)?;

    debug!("created note {:?}", id);

    let location = format!("/api/notes/{id}");
    let body = Json(NoteResponse::new(id, note));

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], body).into_response())
}

/// Replaces the title and description of an existing note.
#[instrument(skip(state, payload))]
pub async fn update_note(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    NoteJson(payload): NoteJson<NoteRequest>,
) -> Result<Json<NoteResponse>, NoteError> {
    let note = state
        .notes
        .update(&id, payload.title, payload.description)
        .map_err(store_failed)?;

    match note {
        Some(note) => {
            debug!("updated note {:?}", id);
            Ok(Json(NoteResponse::new(id, note)))
        }
        None => {
            warn!("attempted to update missing note {:?}", id);
            Err(NoteError::NotFound(id))
        }
    }
}

/// Removes a note.
#[instrument(skip(state))]
pub async fn delete_note(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, NoteError> {
    if state.notes.delete(&id).map_err(store_failed)? {
        debug!("deleted note {:?}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        warn!("attempted to delete missing note {:?}", id);
        Err(NoteError::NotFound(id))
    }
}
