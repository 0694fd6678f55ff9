use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::ServerMessage;

/// Outgoing message queue of one connection, drained by its writer task
pub type Outbox = UnboundedSender<Arc<ServerMessage>>;

/// A connection currently joined to a session
#[derive(Debug, Clone)]
pub struct Member {
    pub identity: String,
    sender: Outbox,
}

impl Member {
    pub fn new(identity: &str, sender: Outbox) -> Self {
        Self {
            identity: identity.to_string(),
            sender,
        }
    }

    /// Queue a message for this connection
    pub fn send(&self, message: Arc<ServerMessage>) -> bool {
        self.sender.send(message).is_ok()
    }
}
