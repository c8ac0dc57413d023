use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{entries, guard, pages, session::SessionStore, sync};
use engine::Engine;
use snapshot::Snapshot;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Present in snapshot mode only.
    pub snapshot: Option<Arc<Snapshot>>,
    pub sessions: SessionStore,
    /// Serializes logins, which may replace the database file.
    pub(crate) logins: Arc<Mutex<()>>,
}

impl ServerState {
    pub fn new(engine: Engine, snapshot: Option<Snapshot>) -> Self {
        Self {
            engine: Arc::new(engine),
            snapshot: snapshot.map(Arc::new),
            sessions: SessionStore::default(),
            logins: Arc::default(),
        }
    }

    /// Forget sessions unused for `timeout`.
    pub fn session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.sessions = SessionStore::new(timeout);
        self
    }
}

pub fn router(state: ServerState) -> Router {
    let guarded = Router::new()
        .route("/submit", post(entries::submit))
        .route("/delete/{id}", delete(entries::delete))
        .route("/entries", get(entries::list))
        .route("/hist_data", get(entries::history));

    let guarded = if state.snapshot.is_some() {
        guarded
            .route("/home", get(pages::home))
            .route("/save", get(sync::save))
            .route("/local_copy", get(sync::local_copy))
            .route("/logout", get(sync::logout))
    } else {
        guarded
    };

    let guarded = guarded.route_layer(middleware::from_fn_with_state(
        state.clone(),
        guard::redirect_unauthenticated,
    ));

    let api = Router::new()
        .route("/update/{id}", post(entries::update))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::reject_unauthenticated,
        ));

    let index = if state.snapshot.is_some() {
        Router::new().route("/", get(pages::login_page).post(sync::login))
    } else {
        Router::new().route("/", get(pages::entry_page))
    };

    Router::new()
        .route("/static/app.js", get(pages::script))
        .merge(index)
        .merge(guarded)
        .merge(api)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(
        "Server listening on {} ({} mode)",
        addr,
        if state.snapshot.is_some() {
            "snapshot"
        } else {
            "plain"
        }
    );

    axum::serve(listener, router(state)).await
}
