//! The realtime port implemented by the infrastructure layer.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tripmate_types::chat::RoomId;
use tripmate_types::error::RealtimeError;

/// One message to publish to a destination on the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publish {
    pub destination: String,
    pub body: String,
}

/// An established, subscribed connection for one room.
///
/// `inbound` yields the raw payload of every message delivered to the room
/// topic, in the order the broker sent them, and ends when the connection
/// closes. Cancelling `shutdown` closes the connection.
#[derive(Debug)]
pub struct RealtimeLink {
    pub inbound: mpsc::Receiver<String>,
    pub outbound: mpsc::Sender<Publish>,
    pub shutdown: CancellationToken,
}

/// Opens a connection and subscribes it to a room's topic.
///
/// Implementations live in tripmate-infra (e.g., `StompTransport`).
pub trait RealtimeTransport: Send + Sync + 'static {
    fn connect(
        &self,
        room_id: RoomId,
    ) -> impl std::future::Future<Output = Result<RealtimeLink, RealtimeError>> + Send;
}
