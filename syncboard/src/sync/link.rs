//! Real-time half of the sync channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use syncboard_proto::codec;
use syncboard_proto::event::BoardEvent;

use super::{SyncConfig, SyncError};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Fire-and-forget event transport between clients of one board.
///
/// `publish` never blocks and never reports failure to the caller; a
/// broadcast that cannot be delivered is logged and dropped. Inbound
/// events come out of `next_event` exactly once, in arrival order.
pub trait EventLink: Send + Sync {
    /// Queues `event` for broadcast to all other connected clients.
    fn publish(&self, event: &BoardEvent);

    /// Awaits the next inbound peer event.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LinkClosed`] once the link is down and the
    /// buffer is drained.
    fn next_event(&self) -> impl std::future::Future<Output = Result<BoardEvent, SyncError>> + Send;

    /// Whether the link is currently open.
    fn is_open(&self) -> bool;

    /// Closes the link. Queued outbound events may still flush; pending
    /// and future [`next_event`](Self::next_event) calls resolve to
    /// [`SyncError::LinkClosed`].
    fn close(&self);
}

/// WebSocket implementation of [`EventLink`].
///
/// One reader task decodes inbound text frames into events; one writer
/// task drains the publish queue into the socket. Both exit when the
/// connection drops or [`close`](EventLink::close) is called.
#[derive(Debug)]
pub struct WsLink {
    outbound: mpsc::UnboundedSender<Message>,
    inbound: Mutex<mpsc::Receiver<BoardEvent>>,
    open: Arc<AtomicBool>,
}

impl WsLink {
    /// Connects to the event hub at `config.hub_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Timeout`] if the handshake exceeds
    /// `config.connect_timeout`, or [`SyncError::Network`] if the
    /// connection fails outright.
    pub async fn connect(config: &SyncConfig) -> Result<Self, SyncError> {
        let url = config.hub_url.as_str();
        let (ws, _response) = tokio::time::timeout(config.connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                tracing::warn!(url, "event hub connect timed out");
                SyncError::Timeout
            })?
            .map_err(|e| {
                tracing::warn!(url, err = %e, "event hub connect failed");
                SyncError::Network(format!("hub connect failed: {e}"))
            })?;
        tracing::info!(url, "event link connected");

        let (ws_sink, ws_stream) = ws.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(config.event_buffer);
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(writer_loop(ws_sink, outbound_rx));
        tokio::spawn(reader_loop(ws_stream, inbound_tx, Arc::clone(&open)));

        Ok(Self {
            outbound: outbound_tx,
            inbound: Mutex::new(inbound_rx),
            open,
        })
    }
}

impl EventLink for WsLink {
    fn publish(&self, event: &BoardEvent) {
        if !self.open.load(Ordering::Relaxed) {
            tracing::debug!(kind = %event.kind(), "publish on closed link dropped");
            return;
        }
        match codec::encode_event(event) {
            Ok(text) => {
                if self.outbound.send(Message::Text(text.into())).is_err() {
                    tracing::warn!(kind = %event.kind(), "event writer gone, broadcast dropped");
                }
            }
            Err(e) => tracing::warn!(err = %e, "failed to encode event for broadcast"),
        }
    }

    async fn next_event(&self) -> Result<BoardEvent, SyncError> {
        let mut inbound = self.inbound.lock().await;
        inbound.recv().await.ok_or(SyncError::LinkClosed)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::Relaxed) {
            // The close frame tells the hub to drop this client; the writer
            // task exits after delivering it.
            let _ = self.outbound.send(Message::Close(None));
            tracing::info!("event link closing");
        }
    }
}

/// Drains the publish queue into the socket. Exits when the queue closes,
/// a send fails, or a queued close frame has been delivered.
async fn writer_loop(mut sink: WsSink, mut outbound: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            tracing::warn!(err = %e, "event frame send failed");
            break;
        }
        if closing {
            break;
        }
    }
    tracing::debug!("event writer task exiting");
}

/// Decodes inbound text frames into events until the connection drops.
/// Malformed frames are logged and skipped.
async fn reader_loop(mut stream: WsStream, inbound: mpsc::Sender<BoardEvent>, open: Arc<AtomicBool>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match codec::decode_event(&text) {
                Ok(event) => {
                    if inbound.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(err = %e, "malformed event frame, skipping"),
            },
            Ok(Message::Close(_)) => {
                tracing::info!("event hub closed the connection");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_)) => {}
            Err(e) => {
                tracing::warn!(err = %e, "event link read error");
                break;
            }
        }
    }
    open.store(false, Ordering::Relaxed);
    tracing::debug!("event reader task exiting");
}
