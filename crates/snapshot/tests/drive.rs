//! `DriveStore` against a local stand-in for the Drive and OAuth endpoints.
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use snapshot::{DriveStore, ObjectStore, SnapshotError};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct FakeDrive {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    refreshes: Arc<AtomicUsize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .is_some_and(|value| value == "Bearer fresh")
}

async fn token(
    State(drive): State<FakeDrive>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if form.get("grant_type").map(String::as_str) != Some("refresh_token")
        || form.get("refresh_token").map(String::as_str) != Some("refresh-me")
    {
        return (StatusCode::BAD_REQUEST, "invalid_grant").into_response();
    }
    drive.refreshes.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({"access_token": "fresh", "expires_in": 3599})).into_response()
}

async fn download(
    State(drive): State<FakeDrive>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }
    if query.get("alt").map(String::as_str) != Some("media") {
        return (StatusCode::BAD_REQUEST, "metadata only").into_response();
    }
    match drive.files.lock().unwrap().get(&id) {
        Some(data) => data.clone().into_response(),
        None => (StatusCode::NOT_FOUND, format!("file not found: {id}")).into_response(),
    }
}

async fn upload(
    State(drive): State<FakeDrive>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }
    if query.get("uploadType").map(String::as_str) != Some("media") {
        return (StatusCode::BAD_REQUEST, "unsupported upload").into_response();
    }
    let mut files = drive.files.lock().unwrap();
    match files.get_mut(&id) {
        Some(data) => {
            *data = body.to_vec();
            StatusCode::OK.into_response()
        }
        None => (StatusCode::NOT_FOUND, format!("file not found: {id}")).into_response(),
    }
}

async fn serve(drive: FakeDrive) -> SocketAddr {
    let app = Router::new()
        .route("/token", post(token))
        .route("/drive/v3/files/{id}", get(download))
        .route("/upload/drive/v3/files/{id}", patch(upload))
        .with_state(drive);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A store whose token must be refreshed at `token_path` before each call.
async fn store(drive: &FakeDrive, token_path: &str) -> (DriveStore, TempDir) {
    let addr = serve(drive.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("token.json"),
        serde_json::json!({
            "token": "stale",
            "refresh_token": "refresh-me",
            "token_uri": format!("http://{addr}{token_path}"),
            "client_id": "client",
            "client_secret": "secret",
        })
        .to_string(),
    )
    .unwrap();
    let store = DriveStore::new(dir.path()).with_endpoints(
        &format!("http://{addr}/drive/v3"),
        &format!("http://{addr}/upload/drive/v3"),
    );
    (store, dir)
}

fn seeded(files: &[(&str, &[u8])]) -> FakeDrive {
    let drive = FakeDrive::default();
    {
        let mut map = drive.files.lock().unwrap();
        for (id, data) in files {
            map.insert(id.to_string(), data.to_vec());
        }
    }
    drive
}

#[tokio::test]
async fn fetch_and_replace_refresh_the_token() {
    let drive = seeded(&[("blob-1", b"v1")]);
    let (store, dir) = store(&drive, "/token").await;

    assert_eq!(store.fetch("blob-1").await.unwrap(), b"v1");
    store.replace("blob-1", b"v2".to_vec()).await.unwrap();

    assert_eq!(drive.files.lock().unwrap()["blob-1"], b"v2");
    assert_eq!(drive.refreshes.load(Ordering::SeqCst), 2);
    let token: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("token.json")).unwrap())
            .unwrap();
    assert_eq!(token["token"], "fresh");
    assert_eq!(token["refresh_token"], "refresh-me");
}

#[tokio::test]
async fn ids_with_reserved_characters_reach_the_right_file() {
    let drive = seeded(&[("folder/expenses?v=2", b"odd")]);
    let (store, _dir) = store(&drive, "/token").await;

    assert_eq!(store.fetch("folder/expenses?v=2").await.unwrap(), b"odd");
}

#[tokio::test]
async fn missing_file_is_a_remote_error() {
    let drive = seeded(&[]);
    let (store, _dir) = store(&drive, "/token").await;

    let err = store.fetch("absent").await.unwrap_err();
    assert!(matches!(err, SnapshotError::Remote(_)), "{err}");
    assert!(err.to_string().contains("404"), "{err}");
}

#[tokio::test]
async fn replace_never_creates_a_file() {
    let drive = seeded(&[]);
    let (store, _dir) = store(&drive, "/token").await;

    let err = store.replace("absent", b"data".to_vec()).await.unwrap_err();
    assert!(matches!(err, SnapshotError::Remote(_)), "{err}");
    assert!(drive.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_refresh_is_a_credentials_error() {
    let drive = seeded(&[("blob-1", b"v1")]);
    let (store, _dir) = store(&drive, "/no-such-endpoint").await;

    let err = store.fetch("blob-1").await.unwrap_err();
    assert!(matches!(err, SnapshotError::Credentials(_)), "{err}");
}
