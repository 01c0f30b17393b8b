//! `RealtimeChannel`: owns at most one connection at a time.
//!
//! - `connect` tears the previous connection down (and waits for its
//!   message pump to finish) before opening a new one, so two rooms are
//!   never subscribed at once.
//! - Inbound payloads are parsed as `ChatMessage` and handed to the
//!   caller's callback in arrival order; malformed payloads are dropped.
//! - `send` is refused unless the state is `Connected`.
//! - `disconnect` is idempotent and ignores stale handles.
//!
//! There is no automatic reconnect. A failed handshake leaves the channel
//! `Disconnected`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use tripmate_types::chat::{ChatMessage, OutgoingMessage, RoomId};
use tripmate_types::error::RealtimeError;
use tripmate_types::realtime::{ConnectionState, room_destination};

use super::transport::{Publish, RealtimeTransport};

/// Identifies one connection returned by [`RealtimeChannel::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionHandle {
    id: u64,
    room_id: RoomId,
}

impl ConnectionHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }
}

struct ActiveConnection {
    handle: ConnectionHandle,
    outbound: mpsc::Sender<Publish>,
    pump: JoinHandle<()>,
    shutdown: DropGuard,
}

pub struct RealtimeChannel<R: RealtimeTransport> {
    transport: R,
    state: Arc<watch::Sender<ConnectionState>>,
    active: Mutex<Option<ActiveConnection>>,
    /// Id of the connection whose pump may still report state; 0 for none.
    active_id: Arc<AtomicU64>,
    next_id: AtomicU64,
}

impl<R: RealtimeTransport> RealtimeChannel<R> {
    pub fn new(transport: R) -> Self {
        Self {
            transport,
            state: Arc::new(watch::Sender::new(ConnectionState::Disconnected)),
            active: Mutex::new(None),
            active_id: Arc::new(AtomicU64::new(0)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub async fn active_room(&self) -> Option<RoomId> {
        self.active.lock().await.as_ref().map(|c| c.handle.room_id)
    }

    /// Connect to `room_id`, replacing any existing connection.
    ///
    /// `on_message` runs on a background task for every well-formed inbound
    /// message until the connection ends.
    pub async fn connect<F>(
        &self,
        room_id: RoomId,
        on_message: F,
    ) -> Result<ConnectionHandle, RealtimeError>
    where
        F: FnMut(ChatMessage) + Send + 'static,
    {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            debug!(room_id = %previous.handle.room_id, "closing previous room connection");
            self.teardown(previous).await;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = ConnectionHandle { id, room_id };
        self.active_id.store(id, Ordering::Release);
        self.state.send_replace(ConnectionState::Connecting);

        let link = match self.transport.connect(room_id).await {
            Ok(link) => link,
            Err(e) => {
                self.active_id.store(0, Ordering::Release);
                self.state.send_replace(ConnectionState::Disconnected);
                warn!(%room_id, error = %e, "realtime connection failed");
                return Err(e);
            }
        };

        self.state.send_replace(ConnectionState::Connected);
        info!(%room_id, "realtime connected");

        let pump = tokio::spawn(pump_messages(
            link.inbound,
            on_message,
            link.shutdown.clone(),
            self.state.clone(),
            self.active_id.clone(),
            id,
        ));
        *active = Some(ActiveConnection {
            handle,
            outbound: link.outbound,
            pump,
            shutdown: link.shutdown.drop_guard(),
        });
        Ok(handle)
    }

    /// Close the connection identified by `handle`.
    ///
    /// Does nothing if that connection is already gone or was replaced.
    pub async fn disconnect(&self, handle: ConnectionHandle) {
        let mut active = self.active.lock().await;
        if active.as_ref().map(|c| c.handle) != Some(handle) {
            debug!(room_id = %handle.room_id, "disconnect ignored: connection not active");
            return;
        }
        if let Some(connection) = active.take() {
            self.active_id.store(0, Ordering::Release);
            self.teardown(connection).await;
            self.state.send_replace(ConnectionState::Disconnected);
            info!(room_id = %handle.room_id, "realtime disconnected");
        }
    }

    /// Publish `message` to `destination` on the active connection.
    pub async fn send(
        &self,
        destination: &str,
        message: &OutgoingMessage,
    ) -> Result<(), RealtimeError> {
        if !self.state().is_connected() {
            return Err(RealtimeError::NotConnected);
        }
        let body =
            serde_json::to_string(message).map_err(|e| RealtimeError::Encode(e.to_string()))?;
        let outbound = self
            .active
            .lock()
            .await
            .as_ref()
            .map(|c| c.outbound.clone())
            .ok_or(RealtimeError::NotConnected)?;
        outbound
            .send(Publish {
                destination: destination.to_string(),
                body,
            })
            .await
            .map_err(|_| RealtimeError::Closed)
    }

    /// Publish `message` to the active room's destination.
    pub async fn send_to_room(&self, message: &OutgoingMessage) -> Result<(), RealtimeError> {
        let room_id = self.active_room().await.ok_or(RealtimeError::NotConnected)?;
        self.send(&room_destination(room_id), message).await
    }

    async fn teardown(&self, connection: ActiveConnection) {
        let ActiveConnection { pump, shutdown, .. } = connection;
        drop(shutdown);
        if let Err(e) = pump.await {
            warn!(error = %e, "realtime message pump ended abnormally");
        }
    }
}

async fn pump_messages<F>(
    mut inbound: mpsc::Receiver<String>,
    mut on_message: F,
    shutdown: CancellationToken,
    state: Arc<watch::Sender<ConnectionState>>,
    active_id: Arc<AtomicU64>,
    id: u64,
) where
    F: FnMut(ChatMessage) + Send + 'static,
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            payload = inbound.recv() => {
                let Some(payload) = payload else {
                    debug!("realtime link closed by peer");
                    break;
                };
                match serde_json::from_str::<ChatMessage>(&payload) {
                    Ok(message) => on_message(message),
                    Err(e) => warn!(error = %e, "dropping malformed realtime payload"),
                }
            }
        }
    }

    state.send_if_modified(|current| {
        if active_id.load(Ordering::Acquire) != id || *current == ConnectionState::Disconnected {
            return false;
        }
        *current = ConnectionState::Disconnected;
        true
    });
}
