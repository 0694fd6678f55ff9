//! One lock per session.
//!
//! Every intent for a PIN runs to completion while holding that session's
//! mutex, and fan-out happens under the same guard so members observe deltas
//! in mutation order. Sends are unbounded channel pushes and never block.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::session::{Member, Session};

pub struct SessionState {
    pub session: Session,
    members: HashMap<Uuid, Member>,
}

impl SessionState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            members: HashMap::new(),
        }
    }

    pub fn add_member(&mut self, connection_id: Uuid, member: Member) {
        self.members.insert(connection_id, member);
    }

    pub fn remove_member(&mut self, connection_id: &Uuid) -> Option<Member> {
        self.members.remove(connection_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Whether any live connection is still bound to `identity`
    pub fn is_connected(&self, identity: &str) -> bool {
        self.members.values().any(|m| m.identity == identity)
    }

    /// Send a message to every connection joined to this session
    pub fn broadcast(&self, message: ServerMessage) {
        let message = Arc::new(message);
        for member in self.members.values() {
            // a dead connection is cleaned up by its own reader task
            let _ = member.send(Arc::clone(&message));
        }
    }

    /// Broadcast the current roster
    pub fn broadcast_players(&self) {
        self.broadcast(ServerMessage::Players(self.session.players()));
    }
}

pub struct SessionHandle {
    pin: String,
    state: Mutex<SessionState>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            pin: session.pin().to_string(),
            state: Mutex::new(SessionState::new(session)),
        }
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Drop a connection from the session.
    ///
    /// If it was the identity's last connection, the player keeps their seat
    /// for `grace` and is removed afterwards unless they rejoin.
    pub async fn detach(self: &Arc<Self>, connection_id: Uuid, grace: Duration) {
        let mut state = self.state.lock().await;
        let Some(member) = state.remove_member(&connection_id) else {
            return;
        };
        if state.is_connected(&member.identity) {
            return;
        }

        let Some(token) = state.session.schedule_removal(&member.identity) else {
            debug!("Removal of {} already pending in {}", member.identity, self.pin);
            return;
        };

        let handle = Arc::clone(self);
        let identity = member.identity.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            handle.expire(&identity, token).await;
        });
        state
            .session
            .attach_removal_timer(&member.identity, token, timer.abort_handle());

        debug!(
            "Player {} left {}; removal in {}s",
            member.identity,
            self.pin,
            grace.as_secs()
        );
    }

    async fn expire(&self, identity: &str, token: u64) {
        let mut state = self.state.lock().await;
        if state.session.expire_presence(identity, token) {
            info!("Player {} removed from {} after grace period", identity, self.pin);
            state.broadcast_players();
        }
    }
}
