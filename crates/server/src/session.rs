//! Server side sessions for snapshot mode.
//!
//! A session exists only after a successful login and carries the
//! passphrase needed to re-encrypt the snapshot. Browsers hold nothing but
//! a random id in the [`SESSION_COOKIE`] cookie.
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use snapshot::Passphrase;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "expenses_session";

/// Idle time after which a session is forgotten.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

/// An authenticated session, as seen by handlers.
#[derive(Clone, Debug)]
pub struct ActiveSession {
    pub id: Uuid,
    pub passphrase: Passphrase,
}

#[derive(Debug)]
struct Held {
    passphrase: Passphrase,
    last_seen: Instant,
}

impl Held {
    fn expired(&self, idle_timeout: Duration) -> bool {
        self.last_seen.elapsed() >= idle_timeout
    }
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Held>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    /// Start a session holding `passphrase` and return its id.
    pub async fn open(&self, passphrase: Passphrase) -> Uuid {
        let id = Uuid::new_v4();
        let held = Held {
            passphrase,
            last_seen: Instant::now(),
        };
        self.sessions.write().await.insert(id, held);
        id
    }

    /// Look a session up and mark it as used. Idle sessions are dropped
    /// along with their passphrase.
    pub async fn get(&self, id: Uuid) -> Option<ActiveSession> {
        let mut sessions = self.sessions.write().await;
        if sessions.get(&id)?.expired(self.idle_timeout) {
            sessions.remove(&id);
            tracing::info!("session {id} expired");
            return None;
        }
        let held = sessions.get_mut(&id)?;
        held.last_seen = Instant::now();
        Some(ActiveSession {
            id,
            passphrase: held.passphrase.clone(),
        })
    }

    /// End a session. Returns whether it existed.
    pub async fn close(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Find the session named by the request cookie, if any.
    pub async fn resolve(&self, jar: &CookieJar) -> Option<ActiveSession> {
        let id = Uuid::parse_str(jar.get(SESSION_COOKIE)?.value()).ok()?;
        self.get(id).await
    }

    /// Whether any live session holds the unlocked database.
    pub async fn any_active(&self) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, held| !held.expired(self.idle_timeout));
        !sessions.is_empty()
    }
}

pub(crate) fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

pub(crate) fn expired_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
