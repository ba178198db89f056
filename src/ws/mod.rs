//! WebSocket transport: wire protocol and connection handling

pub mod handler;
pub mod protocol;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use protocol::ServerMsg;

/// Outbound half of a client connection.
///
/// Cloning shares the same channel; delivery is fire-and-forget.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<ServerMsg>,
}

impl ClientHandle {
    pub fn new(id: Uuid, tx: mpsc::UnboundedSender<ServerMsg>) -> Self {
        Self { id, tx }
    }

    /// Create a handle with a fresh id, returning the receiving half
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(Uuid::new_v4(), tx), rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn send(&self, msg: ServerMsg) {
        if self.tx.send(msg).is_err() {
            debug!(client_id = %self.id, "Dropped message for closed connection");
        }
    }

    pub fn error(&self, code: &str, message: impl Into<String>) {
        self.send(ServerMsg::Error {
            code: code.to_string(),
            message: message.into(),
        });
    }
}
