//! Module containing everything pertaining to the notes API.
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    error_handling::HandleErrorLayer,
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest},
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    BoxError, Extension, Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::{config::ServerConfig, state::AppState};

use self::response::ErrorResponse;

pub mod request;
pub mod response;
pub mod routes;

/// An error type for all errors that may happen while serving a note request.
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    #[error("Request body is too large")]
    PayloadTooLarge,
    #[error("Note {0} does not exist")]
    NotFound(String),
    #[error("Operation could not be completed")]
    OperationFailed,
}

impl IntoResponse for NoteError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::OperationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: format!("{self}"),
        });

        (status, body).into_response()
    }
}

/// A JSON body extractor that only accepts objects. Oversized bodies are
/// reported as [`NoteError::PayloadTooLarge`], every other decoding failure
/// as [`NoteError::MalformedBody`].
#[derive(Debug)]
pub struct NoteJson<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for NoteJson<T>
where
    T: DeserializeOwned,
    Json<Value>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = NoteError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                warn!("rejected request body: {}", rejection.body_text());

                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    NoteError::PayloadTooLarge
                } else {
                    NoteError::MalformedBody(rejection.body_text())
                }
            })?;

        if !value.is_object() {
            warn!("rejected request body that is not a JSON object");
            return Err(NoteError::MalformedBody(
                "expected a JSON object".to_string(),
            ));
        }

        let value = serde_json::from_value(value).map_err(|err| {
            warn!("rejected request body: {}", err);
            NoteError::MalformedBody(err.to_string())
        })?;

        Ok(NoteJson(value))
    }
}

/// Builds the router serving `/api/notes` on top of the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/notes",
            get(routes::list_notes).post(routes::create_note),
        )
        .route(
            "/api/notes/:id",
            put(routes::update_note).delete(routes::delete_note),
        )
        .layer(Extension(state))
}

/// Converts middleware failures into responses so they never reach the
/// connection.
async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorResponse {
                error: "Request timed out".to_string(),
            }),
        )
    } else {
        error!("unhandled middleware error: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("{}", NoteError::OperationFailed),
            }),
        )
    }
}

/// The full application: [`router`] wrapped in the request timeout, trace
/// spans and body size limit from `config`.
pub fn app(state: Arc<AppState>, config: &ServerConfig) -> Router {
    router(state).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .timeout(config.request_timeout())
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(config.max_body_bytes)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method},
    };
    use tower::ServiceExt;

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, ErrorResponse) {
        let mut builder = Request::builder().method(method).uri(uri);

        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }

        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn poisoned_store_answers_internal_error() {
        let state = Arc::new(AppState::new());
        state.notes.poison();

        let note = r#"{"title":"A","description":"d"}"#;
        let requests = [
            (Method::GET, "/api/notes", None),
            (Method::POST, "/api/notes", Some(note)),
            (Method::PUT, "/api/notes/1", Some(note)),
            (Method::DELETE, "/api/notes/1", None),
        ];

        for (method, uri, body) in requests {
            let (status, body) = send(&state, method.clone(), uri, body).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
            assert_eq!(body.error, "Operation could not be completed");
        }
    }

    #[test]
    fn error_statuses() {
        let cases = [
            (NoteError::MalformedBody("x".into()), StatusCode::BAD_REQUEST),
            (NoteError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (NoteError::NotFound("1".into()), StatusCode::NOT_FOUND),
            (NoteError::OperationFailed, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
