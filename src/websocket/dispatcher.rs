//! Routes client intents to sessions and delivers the resulting deltas.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::requested_integer;
use crate::error::CanvasError;
use crate::protocol::{
    ClientMessage, CreateSessionIntent, EraseAreaIntent, JoinIntent, PinIntent, PlacePixelIntent,
    ServerMessage, StartIntent,
};
use crate::session::{now_millis, HostClaim, Member, Outbox, SessionRegistry, SessionState};

/// The session and identity a connection has joined as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub pin: String,
    pub identity: String,
}

/// Per-connection state owned by its socket task
#[derive(Debug)]
pub struct Connection {
    pub id: Uuid,
    outbox: Outbox,
    binding: Option<Binding>,
}

impl Connection {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            id: Uuid::new_v4(),
            outbox,
            binding: None,
        }
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Identity this connection acts as within `pin`, if joined there
    fn identity_in(&self, pin: &str) -> Option<&str> {
        self.binding
            .as_ref()
            .filter(|b| b.pin == pin)
            .map(|b| b.identity.as_str())
    }

    fn send(&self, message: ServerMessage) {
        let _ = self.outbox.send(Arc::new(message));
    }
}

pub struct Dispatcher {
    registry: SessionRegistry,
    grace_period: Duration,
}

impl Dispatcher {
    pub fn new(registry: SessionRegistry, grace_period: Duration) -> Self {
        Self {
            registry,
            grace_period,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Apply one intent from `conn`
    pub async fn handle(&self, conn: &mut Connection, message: ClientMessage) {
        if message.pin().is_empty() {
            debug!("Dropped intent without pin from {}", conn.id);
            return;
        }

        match message {
            ClientMessage::Join(intent) => self.join(conn, intent).await,
            ClientMessage::CreateSession(intent) => self.create_session(conn, intent).await,
            ClientMessage::Start(intent) => self.start(conn, intent).await,
            ClientMessage::Stop(intent) => self.stop(conn, intent).await,
            ClientMessage::ResetGrid(intent) => self.reset_grid(conn, intent).await,
            ClientMessage::EraseArea(intent) => self.erase_area(conn, intent).await,
            ClientMessage::PlacePixel(intent) => self.place_pixel(conn, intent).await,
        }
    }

    /// Connection closed: leave its session, keeping the seat for the grace period
    pub async fn disconnect(&self, conn: &mut Connection) {
        self.leave(conn).await;
    }

    async fn leave(&self, conn: &mut Connection) {
        let Some(binding) = conn.binding.take() else {
            return;
        };
        if let Some(session) = self.registry.get(&binding.pin) {
            session.detach(conn.id, self.grace_period).await;
        }
    }

    async fn join(&self, conn: &mut Connection, intent: JoinIntent) {
        if intent.name.trim().is_empty() || intent.team.trim().is_empty() {
            debug!("Dropped join without name or team from {}", conn.id);
            return;
        }

        let pin = intent.pin.as_str().to_string();
        let identity = intent
            .client_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| conn.id.to_string());

        let binding = Binding {
            pin: pin.clone(),
            identity: identity.clone(),
        };
        if conn.binding.as_ref().is_some_and(|b| *b != binding) {
            self.leave(conn).await;
        }

        let session = self.registry.get_or_create(&pin);
        {
            let mut state = session.lock().await;
            state.add_member(conn.id, Member::new(&identity, conn.outbox.clone()));

            let outcome =
                state
                    .session
                    .join(&identity, &intent.name, &intent.team, intent.is_host, now_millis());

            if outcome.rejoined {
                info!("Player {} rejoined {}", identity, pin);
            } else {
                info!("Player {} ({}) joined {}", identity, intent.name, pin);
            }

            match outcome.host_claim {
                Some(HostClaim::Granted) => {
                    info!("Player {} is host of {}", identity, pin);
                    conn.send(ServerMessage::HostGranted {});
                }
                Some(HostClaim::Denied) => {
                    info!("Host claim by {} on {} denied", identity, pin);
                    conn.send(ServerMessage::HostDenied(CanvasError::HostDenied.to_string()));
                }
                None => {}
            }

            conn.send(ServerMessage::Snapshot(state.session.snapshot()));
            state.broadcast_players();
        }

        conn.binding = Some(binding);
    }

    async fn create_session(&self, conn: &mut Connection, intent: CreateSessionIntent) {
        let pin = intent.pin.as_str();
        let session = self.registry.get_or_create(pin);
        let mut state = session.lock().await;

        let grid_size = requested_integer(intent.grid_size);
        let cooldown_sec = requested_integer(intent.cooldown_sec);
        let result = state
            .session
            .configure(conn.identity_in(pin), grid_size, cooldown_sec);

        if let Some(meta) = self.gated(conn, pin, result) {
            info!(
                "Session {} configured: grid {}, cooldown {}s",
                pin, meta.grid_size, meta.cooldown_sec
            );
            state.broadcast(ServerMessage::Meta(meta));
        }
    }

    async fn start(&self, conn: &mut Connection, intent: StartIntent) {
        let pin = intent.pin.as_str();
        let minutes = intent.round_min.unwrap_or(0.0);
        self.with_session(pin, |state| {
            let result = state
                .session
                .start_round(conn.identity_in(pin), minutes, now_millis());
            if let Some(meta) = self.gated(conn, pin, result) {
                info!("Round started in {} ({} min)", pin, minutes);
                state.broadcast(ServerMessage::Meta(meta));
            }
        })
        .await;
    }

    async fn stop(&self, conn: &mut Connection, intent: PinIntent) {
        let pin = intent.pin.as_str();
        self.with_session(pin, |state| {
            let result = state.session.stop_round(conn.identity_in(pin), now_millis());
            if let Some(meta) = self.gated(conn, pin, result) {
                info!("Round stopped in {}", pin);
                state.broadcast(ServerMessage::Meta(meta));
            }
        })
        .await;
    }

    async fn reset_grid(&self, conn: &mut Connection, intent: PinIntent) {
        let pin = intent.pin.as_str();
        self.with_session(pin, |state| {
            let result = state.session.reset_grid(conn.identity_in(pin));
            if self.gated(conn, pin, result).is_some() {
                info!("Grid reset in {}", pin);
                state.broadcast(ServerMessage::GridReset {});
            }
        })
        .await;
    }

    async fn erase_area(&self, conn: &mut Connection, intent: EraseAreaIntent) {
        let pin = intent.pin.as_str();
        self.with_session(pin, |state| {
            let result =
                state
                    .session
                    .erase_area(conn.identity_in(pin), intent.cx, intent.cy, intent.size);
            match self.gated(conn, pin, result) {
                Some(keys) if !keys.is_empty() => state.broadcast(ServerMessage::Erase { keys }),
                _ => {}
            }
        })
        .await;
    }

    async fn place_pixel(&self, conn: &mut Connection, intent: PlacePixelIntent) {
        let pin = intent.pin.as_str();
        let Some(identity) = conn.identity_in(pin) else {
            debug!("Dropped placement on {} from non-member {}", pin, conn.id);
            return;
        };

        self.with_session(pin, |state| {
            let placed = state.session.place_pixel(
                identity,
                intent.x,
                intent.y,
                &intent.color,
                &intent.team,
                now_millis(),
            );
            if let Some((key, cell)) = placed {
                state.broadcast(ServerMessage::Pixel { key, cell });
            }
        })
        .await;
    }

    /// Run `f` against an existing session; unknown PINs are ignored
    async fn with_session<F>(&self, pin: &str, f: F)
    where
        F: FnOnce(&mut SessionState),
    {
        match self.registry.get(pin) {
            Some(session) => {
                let mut state = session.lock().await;
                f(&mut state);
            }
            None => debug!("Dropped intent for unknown session {}", pin),
        }
    }

    /// Report authorization failures to the caller only
    fn gated<T>(&self, conn: &Connection, pin: &str, result: Result<T, CanvasError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                info!("Rejected host-only intent on {} from {}: {}", pin, conn.id, e);
                conn.send(ServerMessage::HostRequired(e.to_string()));
                None
            }
        }
    }
}
