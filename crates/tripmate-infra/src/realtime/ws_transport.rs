//! StompTransport -- concrete [`RealtimeTransport`] speaking STOMP over a
//! WebSocket (`tokio-tungstenite`).
//!
//! `connect` performs the whole handshake (WebSocket upgrade, `CONNECT` /
//! `CONNECTED`, `SUBSCRIBE` to the room topic) under one timeout, then hands
//! the socket to a driver task that multiplexes inbound frames, outbound
//! publishes and shutdown with `tokio::select!`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tripmate_core::realtime::{Publish, RealtimeLink, RealtimeTransport};
use tripmate_types::chat::RoomId;
use tripmate_types::config::RealtimeConfig;
use tripmate_types::error::RealtimeError;
use tripmate_types::realtime::room_topic;

use super::stomp::{Command, Frame, decode};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SUBSCRIPTION_ID: &str = "sub-0";
const INBOUND_BUFFER: usize = 256;
const OUTBOUND_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct StompTransport {
    url: String,
    host: String,
    handshake_timeout: Duration,
}

impl StompTransport {
    pub fn new(config: &RealtimeConfig) -> Self {
        let host = url::Url::parse(&config.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());
        Self {
            url: config.url.clone(),
            host,
            handshake_timeout: config.handshake_timeout(),
        }
    }
}

impl RealtimeTransport for StompTransport {
    fn connect(
        &self,
        room_id: RoomId,
    ) -> impl std::future::Future<Output = Result<RealtimeLink, RealtimeError>> + Send {
        let url = self.url.clone();
        let host = self.host.clone();
        let handshake_timeout = self.handshake_timeout;

        async move {
            let ws = tokio::time::timeout(handshake_timeout, handshake(&url, &host, room_id))
                .await
                .map_err(|_| RealtimeError::HandshakeTimeout)??;
            info!(%room_id, "subscribed to {}", room_topic(room_id));

            let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
            let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
            let shutdown = CancellationToken::new();
            tokio::spawn(drive(ws, inbound_tx, outbound_rx, shutdown.clone()));

            Ok(RealtimeLink {
                inbound: inbound_rx,
                outbound: outbound_tx,
                shutdown,
            })
        }
    }
}

async fn handshake(url: &str, host: &str, room_id: RoomId) -> Result<WsStream, RealtimeError> {
    let (mut ws, _response) = connect_async(url)
        .await
        .map_err(|e| RealtimeError::Connect(e.to_string()))?;
    debug!(%url, "websocket open, sending CONNECT");

    ws.send(Message::text(Frame::connect(host).encode()))
        .await
        .map_err(|e| RealtimeError::Connect(e.to_string()))?;

    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let frames =
                    decode(text.as_str()).map_err(|e| RealtimeError::Handshake(e.to_string()))?;
                if let Some(frame) = frames.iter().find(|f| {
                    matches!(f.command, Command::Connected | Command::Error)
                }) {
                    if frame.command == Command::Error {
                        return Err(RealtimeError::Handshake(frame.error_message()));
                    }
                    debug!(version = frame.get("version").unwrap_or("?"), "STOMP session established");
                    break;
                }
            }
            Some(Ok(Message::Close(_))) | None => return Err(RealtimeError::Closed),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(RealtimeError::Connect(e.to_string())),
        }
    }

    ws.send(Message::text(
        Frame::subscribe(SUBSCRIPTION_ID, &room_topic(room_id)).encode(),
    ))
    .await
    .map_err(|e| RealtimeError::Connect(e.to_string()))?;
    Ok(ws)
}

async fn drive(
    mut ws: WsStream,
    inbound: mpsc::Sender<String>,
    mut outbound: mpsc::Receiver<Publish>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = ws.send(Message::text(Frame::disconnect().encode())).await;
                let _ = ws.close(None).await;
                debug!("realtime connection closed by client");
                break;
            }

            publish = outbound.recv() => {
                let Some(publish) = publish else { break };
                let frame = Frame::send(&publish.destination, &publish.body);
                if let Err(e) = ws.send(Message::text(frame.encode())).await {
                    warn!(error = %e, "failed to publish realtime message");
                    break;
                }
            }

            incoming = ws.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if !forward_frames(text.as_str(), &inbound).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("realtime connection closed by server");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "realtime receive error");
                        break;
                    }
                    // Ping/pong are answered by tungstenite; binary frames are not STOMP text.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Forward `MESSAGE` bodies to the channel. Returns `false` when the
/// connection should end.
async fn forward_frames(text: &str, inbound: &mpsc::Sender<String>) -> bool {
    let frames = match decode(text) {
        Ok(frames) => frames,
        Err(e) => {
            warn!(error = %e, "dropping undecodable STOMP frame");
            return true;
        }
    };
    for frame in frames {
        match frame.command {
            Command::Message => {
                if inbound.send(frame.body).await.is_err() {
                    return false;
                }
            }
            Command::Error => {
                warn!(message = %frame.error_message(), "broker reported an error");
                return false;
            }
            other => debug!(command = %other, "ignoring STOMP frame"),
        }
    }
    true
}
