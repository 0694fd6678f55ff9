//! Protocol messages for WebSocket communication.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::grid::{Cell, CellKey};
use crate::session::roster::PlayerView;
use crate::session::{Meta, Snapshot};

/// Session PIN. Clients may send it as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPin")]
pub struct Pin(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPin {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawPin> for Pin {
    fn from(raw: RawPin) -> Self {
        match raw {
            RawPin::Text(s) => Pin(s.trim().to_string()),
            RawPin::Number(n) => Pin(number_to_pin(&n)),
        }
    }
}

/// Render a numeric PIN without a trailing `.0` for whole numbers
fn number_to_pin(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

impl Pin {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinIntent {
    pub pin: Pin,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default)]
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionIntent {
    pub pin: Pin,
    #[serde(default)]
    pub grid_size: Option<f64>,
    #[serde(default)]
    pub cooldown_sec: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartIntent {
    pub pin: Pin,
    #[serde(default)]
    pub round_min: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PinIntent {
    pub pin: Pin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EraseAreaIntent {
    pub pin: Pin,
    pub cx: i64,
    pub cy: i64,
    pub size: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacePixelIntent {
    pub pin: Pin,
    pub x: i64,
    pub y: i64,
    pub color: String,
    pub team: String,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    Join(JoinIntent),
    CreateSession(CreateSessionIntent),
    Start(StartIntent),
    Stop(PinIntent),
    ResetGrid(PinIntent),
    EraseArea(EraseAreaIntent),
    PlacePixel(PlacePixelIntent),
}

impl ClientMessage {
    /// Parse a client frame. Anything malformed yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    pub fn pin(&self) -> &Pin {
        match self {
            ClientMessage::Join(m) => &m.pin,
            ClientMessage::CreateSession(m) => &m.pin,
            ClientMessage::Start(m) => &m.pin,
            ClientMessage::Stop(m) | ClientMessage::ResetGrid(m) => &m.pin,
            ClientMessage::EraseArea(m) => &m.pin,
            ClientMessage::PlacePixel(m) => &m.pin,
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    Snapshot(Snapshot),
    Meta(Meta),
    Players(BTreeMap<String, PlayerView>),
    Pixel { key: CellKey, cell: Cell },
    Erase { keys: Vec<CellKey> },
    GridReset {},
    HostDenied(String),
    HostRequired(String),
    HostGranted {},
}

impl ServerMessage {
    /// Serialize message to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
