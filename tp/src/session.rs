//! Session state and call-scoped context

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Session id used when no session can be resolved from the call context
pub const DEFAULT_SESSION_ID: &str = "default_session";

/// Default session TTL, in seconds
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

/// Handle to a chat session as seen by the domain core
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    pub id: String,
}

/// Per-session state the core needs across calls
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Scenario receiving cost writes, when one has been selected
    pub scenario_id: Option<String>,
}

/// Call-scoped context for one mutation or reconciliation request
///
/// The session id scopes the remote persistence call only; it never
/// identifies the itinerary object itself.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Session id supplied directly on the web request, when present
    pub web_session_id: Option<String>,

    /// Session object attached to the call, when present
    pub session: Option<SessionHandle>,
}

impl CallContext {
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            web_session_id: Some(session_id.into()),
            session: None,
        }
    }

    /// Resolve the session id: `web_session_id`, then the session object's
    /// id, then the fixed placeholder
    pub fn session_id(&self) -> String {
        if let Some(id) = &self.web_session_id
            && !id.is_empty()
        {
            return id.clone();
        }
        if let Some(session) = &self.session
            && !session.id.is_empty()
        {
            return session.id.clone();
        }
        DEFAULT_SESSION_ID.to_string()
    }
}

/// Explicit session map with TTL eviction
///
/// Owned by the service instance; exposes `clear()` so tests reset state
/// explicitly instead of relying on process-global wipes.
pub struct SessionMap {
    entries: HashMap<String, (SessionState, DateTime<Utc>)>,
    ttl: Duration,
}

impl SessionMap {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Fetch session state, evicting it first if expired
    pub fn get(&mut self, session_id: &str) -> Option<SessionState> {
        let expired = match self.entries.get(session_id) {
            Some((_, touched_at)) => Utc::now() - *touched_at > self.ttl,
            None => return None,
        };
        if expired {
            debug!(%session_id, "SessionMap::get: session expired");
            self.entries.remove(session_id);
            return None;
        }
        self.entries.get(session_id).map(|(state, _)| state.clone())
    }

    /// Insert or refresh a session
    pub fn put(&mut self, session_id: impl Into<String>, state: SessionState) {
        self.entries.insert(session_id.into(), (state, Utc::now()));
    }

    /// Drop sessions older than the TTL
    pub fn evict_expired(&mut self) {
        let cutoff = Utc::now() - self.ttl;
        self.entries.retain(|_, (_, touched_at)| *touched_at > cutoff);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
