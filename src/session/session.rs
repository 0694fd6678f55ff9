use serde::Serialize;
use std::collections::BTreeMap;
use tokio::task::AbortHandle;

use crate::config::{clamp_cooldown, clamp_grid_size, DEFAULT_COOLDOWN_SEC, DEFAULT_GRID_SIZE};
use crate::error::CanvasError;
use crate::grid::{Cell, CellKey, GridStore};
use crate::session::clock::{RoundClock, Status, Timestamp};
use crate::session::cooldown::CooldownGate;
use crate::session::presence::PresenceTracker;
use crate::session::roster::{HostClaim, PlayerView, Roster};

/// Round framing as clients see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub status: Status,
    pub grid_size: i64,
    pub cooldown_sec: i64,
    pub started_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
}

/// Full session state sent to a connection when it joins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub meta: Meta,
    pub grid: BTreeMap<CellKey, Cell>,
    pub players: BTreeMap<String, PlayerView>,
}

/// What happened when a player joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// A pending grace-period removal was cancelled
    pub rejoined: bool,
    /// Result of the host claim, if one was made
    pub host_claim: Option<HostClaim>,
}

/// Authoritative state of one drawing session.
///
/// Not synchronized on its own; `SessionHandle` serializes access to it.
#[derive(Debug)]
pub struct Session {
    pin: String,
    cooldown_sec: i64,
    created_at: Timestamp,
    clock: RoundClock,
    grid: GridStore,
    roster: Roster,
    presence: PresenceTracker,
    cooldown: CooldownGate,
}

impl Session {
    pub fn new(pin: &str, enforce_cooldown: bool, now: Timestamp) -> Self {
        Self {
            pin: pin.to_string(),
            cooldown_sec: DEFAULT_COOLDOWN_SEC,
            created_at: now,
            clock: RoundClock::new(),
            grid: GridStore::new(DEFAULT_GRID_SIZE),
            roster: Roster::new(),
            presence: PresenceTracker::new(),
            cooldown: CooldownGate::new(enforce_cooldown),
        }
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn status(&self) -> Status {
        self.clock.status()
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn meta(&self) -> Meta {
        Meta {
            status: self.clock.status(),
            grid_size: self.grid.size(),
            cooldown_sec: self.cooldown_sec,
            started_at: self.clock.started_at(),
            ends_at: self.clock.ends_at(),
        }
    }

    pub fn players(&self) -> BTreeMap<String, PlayerView> {
        self.roster.view()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            meta: self.meta(),
            grid: self.grid.cells().clone(),
            players: self.players(),
        }
    }

    /// Add or refresh a player, optionally claiming the host seat
    pub fn join(
        &mut self,
        identity: &str,
        name: &str,
        team: &str,
        claim_host: bool,
        now: Timestamp,
    ) -> JoinOutcome {
        let rejoined = self.presence.cancel(identity);
        self.roster.upsert_player(identity, name, team, now);

        let host_claim = claim_host.then(|| self.roster.request_host(identity));

        JoinOutcome {
            rejoined,
            host_claim,
        }
    }

    fn require_host(&self, caller: Option<&str>) -> Result<(), CanvasError> {
        match caller {
            Some(identity) if self.roster.is_host(identity) => Ok(()),
            _ => Err(CanvasError::HostRequired),
        }
    }

    /// Set grid size and cooldown and return to the lobby.
    ///
    /// Allowed for the host, or for anyone while the seat is unclaimed.
    pub fn configure(
        &mut self,
        caller: Option<&str>,
        grid_size: Option<i64>,
        cooldown_sec: Option<i64>,
    ) -> Result<Meta, CanvasError> {
        if self.roster.has_host() {
            self.require_host(caller)?;
        }

        self.grid.resize(clamp_grid_size(grid_size));
        self.cooldown_sec = clamp_cooldown(cooldown_sec);
        self.clock.reset_to_lobby();
        Ok(self.meta())
    }

    pub fn start_round(
        &mut self,
        caller: Option<&str>,
        round_minutes: f64,
        now: Timestamp,
    ) -> Result<Meta, CanvasError> {
        self.require_host(caller)?;
        self.clock.start(round_minutes, now);
        Ok(self.meta())
    }

    pub fn stop_round(&mut self, caller: Option<&str>, now: Timestamp) -> Result<Meta, CanvasError> {
        self.require_host(caller)?;
        self.clock.stop(now);
        Ok(self.meta())
    }

    pub fn reset_grid(&mut self, caller: Option<&str>) -> Result<(), CanvasError> {
        self.require_host(caller)?;
        self.grid.reset();
        Ok(())
    }

    pub fn erase_area(
        &mut self,
        caller: Option<&str>,
        cx: i64,
        cy: i64,
        size: i64,
    ) -> Result<Vec<CellKey>, CanvasError> {
        self.require_host(caller)?;
        Ok(self.grid.erase(cx, cy, size))
    }

    /// Paint a cell. `None` means the placement was dropped.
    pub fn place_pixel(
        &mut self,
        identity: &str,
        x: i64,
        y: i64,
        color: &str,
        team: &str,
        now: Timestamp,
    ) -> Option<(CellKey, Cell)> {
        if !self.clock.is_running() || !self.grid.in_bounds(x, y) {
            return None;
        }
        if !self.cooldown.admit(identity, self.cooldown_sec, now) {
            return None;
        }

        let cell = self.grid.place(x, y, color, team, now).ok()?;
        Some((CellKey::new(x, y), cell))
    }

    /// Start the grace period for a departed player. `None` if already pending.
    pub fn schedule_removal(&mut self, identity: &str) -> Option<u64> {
        self.presence.schedule(identity)
    }

    pub fn attach_removal_timer(&mut self, identity: &str, token: u64, timer: AbortHandle) {
        self.presence.attach(identity, token, timer);
    }

    /// Finish a grace period. Returns true if the player was removed.
    pub fn expire_presence(&mut self, identity: &str, token: u64) -> bool {
        if !self.presence.confirm(identity, token) {
            return false;
        }

        self.roster.remove_player(identity);
        self.roster.release_host_if_owner(identity);
        self.cooldown.forget(identity);
        true
    }
}
