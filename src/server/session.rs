//! Session collaborator.
//!
//! The pipeline never owns session state. It asks a [`SessionStore`] for the
//! session belonging to a request and attaches the returned handle to it;
//! storage, expiry and locking belong to the store.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use super::cookies::DEFAULT_COOKIE_EXPIRY_DAYS;
use super::request::Request;

/// The signed-in principal of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    roles: Vec<String>,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Role comparison is case-insensitive.
    #[must_use]
    pub fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Per-client state shared across exchanges.
#[derive(Debug)]
pub struct Session {
    id: String,
    values: DashMap<String, Value>,
    identity: RwLock<Option<Identity>>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: DashMap::new(),
            identity: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.value().clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.remove(key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Currently signed-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn sign_in(&self, identity: Identity) {
        *self
            .identity
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(identity);
    }

    pub fn sign_out(&self) {
        *self
            .identity
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// Resolves the session belonging to a request.
pub trait SessionStore: Send + Sync {
    /// Name of the cookie carrying the session id.
    fn cookie_name(&self) -> &str;

    /// Return the request's session, creating one when the request carries no
    /// known session cookie.
    fn get_session(&self, request: &Request) -> Arc<Session>;

    /// Forget a session created for an exchange whose cookie never reached
    /// the client.
    fn discard(&self, _id: &str) {}
}

/// Expired sessions are swept once per this many session creations.
pub const SWEEP_INTERVAL: usize = 64;

#[derive(Debug)]
struct StoredSession {
    session: Arc<Session>,
    expires: DateTime<Utc>,
}

/// Process-local session storage keyed by session id.
///
/// A session lives as long as the cookie issued for it
/// (`DEFAULT_COOKIE_EXPIRY_DAYS` unless configured otherwise). Expired
/// sessions are dropped when they are looked up and by a periodic sweep.
#[derive(Debug)]
pub struct InMemorySessionStore {
    cookie_name: String,
    sessions: DashMap<String, StoredSession>,
    ttl: Duration,
    created: AtomicUsize,
}

impl InMemorySessionStore {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            sessions: DashMap::new(),
            ttl: Duration::days(i64::from(DEFAULT_COOKIE_EXPIRY_DAYS)),
            created: AtomicUsize::new(0),
        }
    }

    /// Session lifetime in days, counted from creation.
    #[must_use]
    pub fn with_ttl_days(mut self, days: u32) -> Self {
        self.ttl = Duration::days(i64::from(days));
        self
    }

    /// Drop a session, e.g. on sign-out.
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, s)| s.session)
    }

    /// Drop every expired session, returning how many were removed.
    pub fn remove_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, stored| stored.expires > now);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed, remaining = self.sessions.len(), "Expired sessions swept");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn get_session(&self, request: &Request) -> Arc<Session> {
        let now = Utc::now();
        if let Some(cookie) = request.cookies().get(&self.cookie_name) {
            let live = self
                .sessions
                .get(cookie.value())
                .map(|stored| (stored.expires > now).then(|| Arc::clone(&stored.session)));
            match live {
                Some(Some(session)) => return session,
                Some(None) => {
                    self.sessions.remove(cookie.value());
                    debug!(session_id = %cookie.value(), "Session expired");
                }
                None => {}
            }
        }

        if (self.created.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            self.remove_expired();
        }
        let id = ulid::Ulid::new().to_string();
        let session = Arc::new(Session::new(id.clone()));
        self.sessions.insert(
            id.clone(),
            StoredSession {
                session: Arc::clone(&session),
                expires: now + self.ttl,
            },
        );
        debug!(session_id = %id, total_sessions = self.sessions.len(), "Session created");
        session
    }

    fn discard(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            debug!(session_id = %id, "Session discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::request::parse_request;

    fn request_with_cookie(cookie: Option<&str>) -> Request {
        let mut raw = String::from("GET / HTTP/1.1\r\nHost: localhost\r\n");
        if let Some(c) = cookie {
            raw.push_str(&format!("Cookie: {c}\r\n"));
        }
        raw.push_str("\r\n");
        parse_request(&raw).unwrap()
    }

    #[test]
    fn test_new_session_when_cookie_missing() {
        let store = InMemorySessionStore::new("SID");
        let a = store.get_session(&request_with_cookie(None));
        let b = store.get_session(&request_with_cookie(None));
        assert_ne!(a.id(), b.id());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_existing_session_is_reused() {
        let store = InMemorySessionStore::new("SID");
        let first = store.get_session(&request_with_cookie(None));
        first.insert("cart", serde_json::json!(3));
        let again = store.get_session(&request_with_cookie(Some(&format!("SID={}", first.id()))));
        assert_eq!(again.id(), first.id());
        assert_eq!(again.get("cart"), Some(serde_json::json!(3)));
    }

    #[test]
    fn test_unknown_session_id_gets_fresh_session() {
        let store = InMemorySessionStore::new("SID");
        let s = store.get_session(&request_with_cookie(Some("SID=forged")));
        assert_ne!(s.id(), "forged");
    }

    #[test]
    fn test_expired_session_is_replaced() {
        let store = InMemorySessionStore::new("SID").with_ttl_days(0);
        let first = store.get_session(&request_with_cookie(None));
        let again = store.get_session(&request_with_cookie(Some(&format!("SID={}", first.id()))));
        assert_ne!(again.id(), first.id());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_expired() {
        let store = InMemorySessionStore::new("SID").with_ttl_days(0);
        for _ in 0..3 {
            store.get_session(&request_with_cookie(None));
        }
        assert_eq!(store.remove_expired(), 3);
        assert!(store.is_empty());

        let live = InMemorySessionStore::new("SID");
        live.get_session(&request_with_cookie(None));
        assert_eq!(live.remove_expired(), 0);
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn test_periodic_sweep_bounds_growth() {
        let store = InMemorySessionStore::new("SID").with_ttl_days(0);
        for _ in 0..SWEEP_INTERVAL {
            store.get_session(&request_with_cookie(None));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_discard() {
        let store = InMemorySessionStore::new("SID");
        let s = store.get_session(&request_with_cookie(None));
        store.discard(s.id());
        assert!(store.is_empty());
    }

    #[test]
    fn test_sign_in_and_out() {
        let session = Session::new("x");
        assert!(session.identity().is_none());
        session.sign_in(Identity::new("ana").with_roles(["Admin"]));
        let who = session.identity().unwrap();
        assert_eq!(who.username(), "ana");
        assert!(who.is_in_role("admin"));
        session.sign_out();
        assert!(session.identity().is_none());
    }
}
