//! Player roster and host seat arbitration.
//!
//! Player identity is whatever string the client sends as `clientId`. It is
//! trusted as-is: anyone who knows a host's id can reclaim that seat.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::session::clock::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    pub team: String,
    pub updated_at: Timestamp,
}

/// Wire form of a roster entry, with `isHost` derived from the seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub name: String,
    pub team: String,
    pub is_host: bool,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostClaim {
    Granted,
    Denied,
}

#[derive(Debug, Default)]
pub struct Roster {
    players: BTreeMap<String, PlayerInfo>,
    host_id: Option<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or refresh a player entry. Host seat is untouched.
    pub fn upsert_player(
        &mut self,
        identity: &str,
        name: &str,
        team: &str,
        now: Timestamp,
    ) -> PlayerInfo {
        let info = PlayerInfo {
            name: name.to_string(),
            team: team.to_string(),
            updated_at: now,
        };
        self.players.insert(identity.to_string(), info.clone());
        info
    }

    pub fn remove_player(&mut self, identity: &str) -> Option<PlayerInfo> {
        self.players.remove(identity)
    }

    pub fn get(&self, identity: &str) -> Option<&PlayerInfo> {
        self.players.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.players.contains_key(identity)
    }

    /// Claim the host seat. The only place `host_id` is ever set.
    pub fn request_host(&mut self, identity: &str) -> HostClaim {
        match &self.host_id {
            Some(current) if current != identity => HostClaim::Denied,
            _ => {
                self.host_id = Some(identity.to_string());
                HostClaim::Granted
            }
        }
    }

    /// Free the seat if `identity` holds it
    pub fn release_host_if_owner(&mut self, identity: &str) -> bool {
        if self.is_host(identity) {
            self.host_id = None;
            true
        } else {
            false
        }
    }

    pub fn is_host(&self, identity: &str) -> bool {
        self.host_id.as_deref() == Some(identity)
    }

    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    pub fn has_host(&self) -> bool {
        self.host_id.is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn view(&self) -> BTreeMap<String, PlayerView> {
        self.players
            .iter()
            .map(|(id, info)| {
                let view = PlayerView {
                    name: info.name.clone(),
                    team: info.team.clone(),
                    is_host: self.is_host(id),
                    updated_at: info.updated_at,
                };
                (id.clone(), view)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_refreshes_entry() {
        let mut roster = Roster::new();
        roster.upsert_player("p1", "Ann", "A", 1);
        roster.upsert_player("p1", "Ann", "B", 2);

        assert_eq!(roster.len(), 1);
        let info = roster.get("p1").unwrap();
        assert_eq!(info.team, "B");
        assert_eq!(info.updated_at, 2);
    }

    #[test]
    fn test_upsert_does_not_grant_host() {
        let mut roster = Roster::new();
        roster.upsert_player("p1", "Ann", "A", 1);
        assert!(!roster.has_host());
        assert!(!roster.view()["p1"].is_host);
    }

    #[test]
    fn test_host_is_unique() {
        let mut roster = Roster::new();
        assert_eq!(roster.request_host("p1"), HostClaim::Granted);
        assert_eq!(roster.request_host("p2"), HostClaim::Denied);
        assert_eq!(roster.host_id(), Some("p1"));

        // re-claim by the holder is idempotent
        assert_eq!(roster.request_host("p1"), HostClaim::Granted);
        assert_eq!(roster.host_id(), Some("p1"));
    }

    #[test]
    fn test_release_only_by_owner() {
        let mut roster = Roster::new();
        roster.request_host("p1");

        assert!(!roster.release_host_if_owner("p2"));
        assert!(roster.is_host("p1"));

        assert!(roster.release_host_if_owner("p1"));
        assert!(!roster.has_host());
        assert_eq!(roster.request_host("p2"), HostClaim::Granted);
    }

    #[test]
    fn test_view_derives_is_host() {
        let mut roster = Roster::new();
        roster.upsert_player("p1", "Ann", "A", 1);
        roster.upsert_player("p2", "Bob", "B", 1);
        roster.request_host("p2");

        let view = roster.view();
        assert!(!view["p1"].is_host);
        assert!(view["p2"].is_host);

        let json = serde_json::to_value(&view["p2"]).unwrap();
        assert_eq!(json["isHost"], true);
        assert_eq!(json["updatedAt"], 1);
    }
}
