//! In-memory session store
//!
//! Sessions map a random id to an absolute expiry. Expired entries are swept
//! whenever the store is consulted.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

/// Lifetime of a session created by a successful login
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "sessionId";

/// Session id to expiry map shared by all connections
#[derive(Debug)]
pub struct SessionStore {
    by_id: Mutex<HashMap<String, SystemTime>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            by_id: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Register a fresh session and return its id
    pub fn create(&self, now: SystemTime) -> String {
        let mut sessions = self.by_id.lock().unwrap_or_else(PoisonError::into_inner);
        purge_expired(&mut sessions, now);

        let mut id = generate_id();
        while sessions.contains_key(&id) {
            id = generate_id();
        }
        sessions.insert(id.clone(), now + self.ttl);
        id
    }

    /// Sweep expired sessions, then check `id`
    pub fn is_valid(&self, id: &str, now: SystemTime) -> bool {
        let mut sessions = self.by_id.lock().unwrap_or_else(PoisonError::into_inner);
        purge_expired(&mut sessions, now);
        sessions.contains_key(id)
    }

    /// Number of live entries (after the last sweep)
    pub fn len(&self) -> usize {
        self.by_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge_expired(sessions: &mut HashMap<String, SystemTime>, now: SystemTime) {
    sessions.retain(|_, expires_at| *expires_at >= now);
}

/// 32 hex characters from 16 random bytes
fn generate_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// `Set-Cookie` value for a new session
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; HttpOnly; Path=/")
}

/// Extract the session id from a `Cookie` header value
pub fn session_from_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key == SESSION_COOKIE).then_some(value)
    })
}
