//! Snapshot lifecycle endpoints: login, save, local copy and logout.
use std::sync::Arc;

use api_types::session::Login;
use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use snapshot::{Passphrase, Snapshot};

use crate::{
    ServerError, pages,
    server::ServerState,
    session::{ActiveSession, expired_cookie, session_cookie},
};

fn snapshot(state: &ServerState) -> Result<&Arc<Snapshot>, ServerError> {
    state
        .snapshot
        .as_ref()
        .ok_or_else(|| ServerError::Generic("snapshot sync is not configured".to_string()))
}

/// Unlock the snapshot, then open a session.
///
/// The first session downloads and decrypts the remote blob. While another
/// session holds the database the passphrase is only checked against the
/// local encrypted copy, so unsaved work is neither overwritten nor removed.
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Form(payload): Form<Login>,
) -> Result<Response, ServerError> {
    let snapshot = snapshot(&state)?;
    let passphrase = Passphrase::new(payload.password);
    let _login = state.logins.lock().await;

    let shared = state.sessions.any_active().await;
    let result = if shared {
        snapshot.verify(&passphrase).await
    } else {
        snapshot.login(&passphrase).await
    };

    if let Err(err) = result {
        tracing::warn!("login failed: {err}");
        if !shared {
            snapshot.discard_local().await;
        }
        return Ok((
            StatusCode::UNAUTHORIZED,
            Html(pages::login_failed(&err.to_string())),
        )
            .into_response());
    }

    if let Some(previous) = state.sessions.resolve(&jar).await {
        state.sessions.close(previous.id).await;
    }
    let id = state.sessions.open(passphrase).await;
    tracing::info!("session {id} opened");

    Ok((jar.add(session_cookie(id)), Redirect::to("/home")).into_response())
}

/// Encrypt the database and upload it.
pub async fn save(
    State(state): State<ServerState>,
    Extension(session): Extension<ActiveSession>,
) -> Result<Redirect, ServerError> {
    snapshot(&state)?.save(&session.passphrase).await?;
    Ok(Redirect::to("/home"))
}

/// Encrypt the database into a timestamped local backup.
pub async fn local_copy(
    State(state): State<ServerState>,
    Extension(session): Extension<ActiveSession>,
) -> Result<Redirect, ServerError> {
    snapshot(&state)?.local_copy(&session.passphrase).await?;
    Ok(Redirect::to("/home"))
}

/// Best-effort save, then drop the session. The local files go with the
/// last session.
pub async fn logout(
    State(state): State<ServerState>,
    jar: CookieJar,
    Extension(session): Extension<ActiveSession>,
) -> Result<(CookieJar, Redirect), ServerError> {
    let snapshot = snapshot(&state)?;
    let _login = state.logins.lock().await;

    state.sessions.close(session.id).await;
    if state.sessions.any_active().await {
        if let Err(err) = snapshot.save(&session.passphrase).await {
            tracing::warn!("save on logout failed: {err}");
        }
    } else {
        snapshot.logout(&session.passphrase).await;
    }
    tracing::info!("session {} closed", session.id);

    Ok((jar.remove(expired_cookie()), Redirect::to("/")))
}
