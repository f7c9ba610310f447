//! Cookie-keyed sessions holding pending CSRF state.
//!
//! Each browser session holds at most one outstanding `state` value between
//! the authorization redirect and its matching callback. States are
//! single-use: they are consumed the moment a callback is checked against
//! them, match or not, so a callback cannot be replayed.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "syndic_session";

/// How long a pending state remains valid (seconds)
pub const STATE_TTL_SECONDS: i64 = 600;

struct PendingState {
    state: String,
    created_at: DateTime<Utc>,
}

/// In-memory session store with automatic expiration.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<String, PendingState>>>,
    expiry_duration: Duration,
}

impl SessionStore {
    pub fn new(expiry_seconds: i64) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            expiry_duration: Duration::seconds(expiry_seconds),
        }
    }

    /// Store a pending state for a session, replacing any prior one.
    pub fn begin(&self, session_id: &str, state: &str) {
        let entry = PendingState {
            state: state.to_string(),
            created_at: Utc::now(),
        };

        let mut entries = self.entries.lock().unwrap();
        entries.insert(session_id.to_string(), entry);
    }

    /// Consume the pending state for a session (single-use).
    ///
    /// Returns None when no state is pending or the pending one has expired.
    pub fn take(&self, session_id: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();

        let entry = entries.remove(session_id)?;

        if Utc::now() - entry.created_at > self.expiry_duration {
            return None;
        }

        Some(entry.state)
    }

    /// Clean up expired entries (called periodically)
    pub fn cleanup_expired(&self) {
        let mut entries = self.entries.lock().unwrap();
        let now = Utc::now();

        entries.retain(|_, entry| now - entry.created_at <= self.expiry_duration);
    }

    /// Count of sessions with a pending state
    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Background task to periodically clean up expired session entries
pub async fn run_session_cleanup(store: SessionStore, interval_seconds: u64) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_seconds));

    loop {
        interval.tick().await;
        store.cleanup_expired();
        tracing::debug!(
            "Session cleanup complete, {} pending states remaining",
            store.count()
        );
    }
}

/// Extract the session id from the request's cookie header, if present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    for pair in cookies.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == SESSION_COOKIE && !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}

/// Build the Set-Cookie value carrying the session id.
///
/// Scoped to the mount path so the cookie travels with the callback request
/// and nowhere else.
pub fn session_cookie(session_id: &str, mount_path: &str) -> String {
    let path = if mount_path.is_empty() {
        "/"
    } else {
        mount_path
    };
    format!(
        "{}={}; Path={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id, path
    )
}
