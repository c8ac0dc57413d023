//! Session guard for snapshot mode.
//!
//! Both middlewares let every request through in plain mode. In snapshot
//! mode they look up the session cookie and, on success, make the
//! [`ActiveSession`](crate::ActiveSession) available to handlers as an extension.
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{ServerError, server::ServerState};

/// Page and form routes: unauthenticated callers are sent to the login page.
pub(crate) async fn redirect_unauthenticated(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if state.snapshot.is_none() {
        return next.run(request).await;
    }

    match state.sessions.resolve(&jar).await {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => Redirect::to("/").into_response(),
    }
}

/// JSON routes: unauthenticated callers get a 401 with a JSON body.
pub(crate) async fn reject_unauthenticated(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if state.snapshot.is_none() {
        return Ok(next.run(request).await);
    }

    let session = state
        .sessions
        .resolve(&jar)
        .await
        .ok_or(ServerError::Unauthenticated)?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
