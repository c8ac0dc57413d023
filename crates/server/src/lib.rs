use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;
use snapshot::SnapshotError;

use serde::Serialize;
pub use server::{ServerState, router, run_with_listener};
pub use session::{ActiveSession, DEFAULT_IDLE_TIMEOUT, SESSION_COOKIE, SessionStore};

mod entries;
mod guard;
mod pages;
mod server;
mod session;
mod sync;

pub mod types {
    pub mod entry {
        pub use api_types::entry::{Amount, EntryForm, EntryRow, EntryUpdate, HistoryPoint};
    }

    pub mod session {
        pub use api_types::session::Login;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Snapshot(SnapshotError),
    Unauthenticated,
    Generic(String),
}

/// JSON error body, used where the client expects JSON back.
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::MissingDate
        | EngineError::InvalidAmount(_)
        | EngineError::NonFiniteAmount(_) => StatusCode::BAD_REQUEST,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err)).into_response()
            }
            ServerError::Snapshot(err) => {
                tracing::error!("snapshot error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
            ServerError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(Error {
                    error: "not authenticated".to_string(),
                }),
            )
                .into_response(),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err).into_response(),
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<SnapshotError> for ServerError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}
