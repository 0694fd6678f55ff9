//! Optional server-side placement cooldown.
//!
//! Off by default: the cooldown is otherwise only a hint clients honour.

use std::collections::HashMap;

use crate::session::clock::Timestamp;

#[derive(Debug, Default)]
pub struct CooldownGate {
    enabled: bool,
    last_placement: HashMap<String, Timestamp>,
}

impl CooldownGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_placement: HashMap::new(),
        }
    }

    /// Check whether `identity` may place at `now`, recording it if so
    pub fn admit(&mut self, identity: &str, cooldown_sec: i64, now: Timestamp) -> bool {
        if !self.enabled {
            return true;
        }

        if let Some(last) = self.last_placement.get(identity) {
            if now - last < cooldown_sec * 1000 {
                return false;
            }
        }
        self.last_placement.insert(identity.to_string(), now);
        true
    }

    pub fn forget(&mut self, identity: &str) {
        self.last_placement.remove(identity);
    }
}
