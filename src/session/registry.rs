use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::session::{now_millis, Session, SessionHandle};

/// Process-wide table of sessions by PIN.
///
/// Sessions are created on first reference and live until the process exits.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionHandle>>,
    enforce_cooldown: bool,
}

impl SessionRegistry {
    pub fn new(enforce_cooldown: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            enforce_cooldown,
        }
    }

    /// Look up a session, creating it if this PIN is new
    pub fn get_or_create(&self, pin: &str) -> Arc<SessionHandle> {
        let entry = self.sessions.entry(pin.to_string()).or_insert_with(|| {
            info!("Session {} created", pin);
            Arc::new(SessionHandle::new(Session::new(
                pin,
                self.enforce_cooldown,
                now_millis(),
            )))
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, pin: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.get(pin).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}
