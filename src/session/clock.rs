//! Round lifecycle: lobby, running, ended

use serde::Serialize;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Wall-clock now, in the unit every timestamp on the wire uses
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Lobby,
    Running,
    Ended,
}

/// Status state machine with an advisory deadline.
///
/// `ends_at` is metadata for clients; nothing here ends a round when it passes.
#[derive(Debug, Clone)]
pub struct RoundClock {
    status: Status,
    started_at: Option<Timestamp>,
    ends_at: Option<Timestamp>,
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundClock {
    pub fn new() -> Self {
        Self {
            status: Status::Lobby,
            started_at: None,
            ends_at: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn ends_at(&self) -> Option<Timestamp> {
        self.ends_at
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    /// Back to the lobby, dropping any round framing
    pub fn reset_to_lobby(&mut self) {
        self.status = Status::Lobby;
        self.started_at = None;
        self.ends_at = None;
    }

    /// Start a round. A non-positive length means an untimed round, and so
    /// does one too long to represent.
    pub fn start(&mut self, round_minutes: f64, now: Timestamp) {
        self.status = Status::Running;
        self.started_at = Some(now);
        self.ends_at = if round_minutes > 0.0 {
            now.checked_add((round_minutes * 60_000.0).round() as i64)
        } else {
            None
        };
    }

    /// End the round at `now`, overriding any scheduled end
    pub fn stop(&mut self, now: Timestamp) {
        self.status = Status::Ended;
        self.ends_at = Some(now);
    }
}
