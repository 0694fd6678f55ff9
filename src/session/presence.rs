//! Deferred player removal after a disconnect.
//!
//! Each pending removal carries a token. The timer that fires it must present
//! the same token under the session lock, so a removal that was cancelled by a
//! rejoin (or replaced by a newer one) can never take effect.

use std::collections::HashMap;
use tokio::task::AbortHandle;

#[derive(Debug)]
struct PendingRemoval {
    token: u64,
    timer: Option<AbortHandle>,
}

#[derive(Debug, Default)]
pub struct PresenceTracker {
    pending: HashMap<String, PendingRemoval>,
    next_token: u64,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a removal for `identity`.
    ///
    /// Returns the new token, or `None` if one is already pending.
    pub fn schedule(&mut self, identity: &str) -> Option<u64> {
        if self.pending.contains_key(identity) {
            return None;
        }

        self.next_token += 1;
        let token = self.next_token;
        self.pending.insert(
            identity.to_string(),
            PendingRemoval { token, timer: None },
        );
        Some(token)
    }

    /// Remember the timer task driving a pending removal so it can be aborted
    pub fn attach(&mut self, identity: &str, token: u64, timer: AbortHandle) {
        match self.pending.get_mut(identity) {
            Some(pending) if pending.token == token => pending.timer = Some(timer),
            _ => timer.abort(),
        }
    }

    /// Cancel a pending removal. Returns true if one was pending.
    pub fn cancel(&mut self, identity: &str) -> bool {
        match self.pending.remove(identity) {
            Some(pending) => {
                if let Some(timer) = pending.timer {
                    timer.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Consume a pending removal when its timer fires.
    ///
    /// Returns true only if the removal identified by `token` is still pending.
    pub fn confirm(&mut self, identity: &str, token: u64) -> bool {
        match self.pending.get(identity) {
            Some(pending) if pending.token == token => {
                self.pending.remove(identity);
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self, identity: &str) -> bool {
        self.pending.contains_key(identity)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
