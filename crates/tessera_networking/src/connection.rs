//! # Client Connection
//!
//! One task per client running two loops side by side:
//!
//! ```text
//! receive loop: frame ─▶ decode ─▶ ViewportRequest ─▶ bus ─▶ await bridge ─▶ send
//! refresh loop: every refresh interval, replay the last request
//! ```
//!
//! Both loops stop when the connection token or the process token fires,
//! and either loop ending fires the connection token. Sends go through one
//! async lock so frames never interleave. Protocol violations are answered
//! with an error frame and the connection stays up.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;

use crate::bridge::CorrelationBridge;
use crate::events::{EventBus, ViewportQuery, WorldEvent};
use crate::protocol::{
    decode_frame, encode_frame, ErrorCode, ErrorMessage, MessageType, ViewportData, ViewportRequest,
    MSG_SERVER_ERROR, MSG_UNKNOWN_TYPE,
};
use crate::shutdown::ShutdownToken;
use crate::transport::{FrameSink, FrameSource, TransportError};

/// Connection identifier, unique per server run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// State shared by every connection.
#[derive(Debug)]
pub struct SessionContext {
    /// Where viewport requests are published.
    pub bus: Arc<EventBus>,
    /// Where viewport results come back.
    pub viewport_bridge: Arc<CorrelationBridge<ViewportData>>,
    /// Viewport refresh period.
    pub refresh_interval: Duration,
    /// Process-wide shutdown.
    pub shutdown: ShutdownToken,
}

/// A client session over some frame transport.
pub struct Connection<S> {
    id: ConnectionId,
    ctx: Arc<SessionContext>,
    sink: tokio::sync::Mutex<S>,
    last_request: Mutex<Option<ViewportRequest>>,
    cancel: ShutdownToken,
}

impl<S: FrameSink> Connection<S> {
    /// Creates a session writing to `sink`.
    #[must_use]
    pub fn new(id: ConnectionId, ctx: Arc<SessionContext>, sink: S) -> Self {
        Self {
            id,
            ctx,
            sink: tokio::sync::Mutex::new(sink),
            last_request: Mutex::new(None),
            cancel: ShutdownToken::new(),
        }
    }

    /// Connection id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Token that closes only this connection.
    #[must_use]
    pub fn cancel_token(&self) -> ShutdownToken {
        self.cancel.clone()
    }

    /// Last viewport request received, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<ViewportRequest> {
        *self.last_request.lock()
    }

    /// Runs both loops until either ends, then closes the sink.
    pub async fn run<R: FrameSource>(&self, source: R) {
        tracing::info!(connection = %self.id, "connection opened");
        tokio::join!(self.receive_loop(source), self.refresh_loop());

        if let Err(e) = self.sink.lock().await.close().await {
            tracing::debug!(connection = %self.id, error = %e, "close failed");
        }
        tracing::info!(connection = %self.id, "connection closed");
    }

    async fn stopped(&self) {
        tokio::select! {
            () = self.cancel.cancelled() => {}
            () = self.ctx.shutdown.cancelled() => {}
        }
    }

    async fn receive_loop<R: FrameSource>(&self, mut source: R) {
        loop {
            let received = tokio::select! {
                () = self.stopped() => break,
                received = source.recv() => received,
            };
            match received {
                Ok(Some(bytes)) => {
                    if let Err(e) = self.handle_frame(&bytes).await {
                        tracing::warn!(connection = %self.id, error = %e, "send failed");
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!(connection = %self.id, "peer closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!(connection = %self.id, error = %e, "receive failed");
                    break;
                }
            }
        }
        self.cancel.cancel();
    }

    async fn refresh_loop(&self) {
        let mut ticker = tokio::time::interval(self.ctx.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = self.stopped() => break,
                _ = ticker.tick() => {}
            }
            let Some(request) = self.last_request() else {
                continue;
            };
            if let Err(e) = self.serve_viewport(request).await {
                tracing::warn!(connection = %self.id, error = %e, "refresh send failed");
                break;
            }
        }
        self.cancel.cancel();
    }

    async fn handle_frame(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let frame = match decode_frame(bytes) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(connection = %self.id, error = %e, "rejected frame");
                return self.send_error(e.error_code(), e.client_message()).await;
            }
        };

        match frame.message_type {
            MessageType::ViewportRequest => match ViewportRequest::decode(frame.payload) {
                Ok(request) => {
                    *self.last_request.lock() = Some(request);
                    self.serve_viewport(request).await
                }
                Err(e) => {
                    tracing::warn!(connection = %self.id, error = %e, "rejected viewport request");
                    self.send_error(e.error_code(), e.client_message()).await
                }
            },
            other => {
                tracing::warn!(connection = %self.id, message_type = ?other, "unexpected message from client");
                self.send_error(ErrorCode::InvalidMessage, MSG_UNKNOWN_TYPE).await
            }
        }
    }

    async fn serve_viewport(&self, request: ViewportRequest) -> Result<(), TransportError> {
        let bridge = &self.ctx.viewport_bridge;
        let (callback_id, rx) = bridge.register_future();

        let delivered = self
            .ctx
            .bus
            .emit(WorldEvent::ViewportRequest(ViewportQuery { request, callback_id }));
        if delivered == 0 {
            bridge.unregister(callback_id);
            tracing::error!(connection = %self.id, "no viewport handler subscribed");
            return self.send_error(ErrorCode::ServerError, MSG_SERVER_ERROR).await;
        }
        tracing::debug!(connection = %self.id, callback_id = %callback_id, "viewport requested");

        let outcome = tokio::select! {
            () = self.stopped() => None,
            result = rx => Some(result),
        };
        let Some(result) = outcome else {
            return Ok(());
        };

        let encoded = match result {
            Ok(data) => data
                .encode()
                .and_then(|payload| encode_frame(MessageType::ViewportData, &payload)),
            Err(_) => {
                tracing::error!(connection = %self.id, callback_id = %callback_id, "viewport request dropped");
                return self.send_error(ErrorCode::ServerError, MSG_SERVER_ERROR).await;
            }
        };
        match encoded {
            Ok(frame) => self.send(frame).await,
            Err(e) => {
                tracing::error!(connection = %self.id, error = %e, "viewport encoding failed");
                self.send_error(ErrorCode::ServerError, MSG_SERVER_ERROR).await
            }
        }
    }

    async fn send_error(&self, code: ErrorCode, message: &str) -> Result<(), TransportError> {
        let payload = ErrorMessage::new(code, message).encode();
        match encode_frame(MessageType::Error, &payload) {
            Ok(frame) => self.send(frame).await,
            Err(e) => {
                tracing::error!(connection = %self.id, error = %e, "error frame encoding failed");
                Ok(())
            }
        }
    }

    async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.sink.lock().await.send(frame).await
    }
}

impl<S> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::channel_transport;

    fn context(bus: Arc<EventBus>) -> Arc<SessionContext> {
        Arc::new(SessionContext {
            bus,
            viewport_bridge: Arc::new(CorrelationBridge::new()),
            refresh_interval: Duration::from_secs(3600),
            shutdown: ShutdownToken::new(),
        })
    }

    async fn next_error(incoming: &mut tokio::sync::mpsc::Receiver<Vec<u8>>) -> ErrorMessage {
        let bytes = incoming.recv().await.expect("frame");
        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.message_type, MessageType::Error);
        ErrorMessage::decode(frame.payload).unwrap()
    }

    #[tokio::test]
    async fn test_bad_frames_answered_connection_stays_open() {
        let ctx = context(Arc::new(EventBus::new()));
        let (source, sink, mut peer) = channel_transport(8);
        let connection = Arc::new(Connection::new(ConnectionId(1), Arc::clone(&ctx), sink));
        let task = {
            let connection = Arc::clone(&connection);
            tokio::spawn(async move { connection.run(source).await })
        };

        peer.outgoing.send(vec![1, 0]).await.unwrap();
        let error = next_error(&mut peer.incoming).await;
        assert_eq!(error.error_code(), Some(ErrorCode::InvalidMessage));
        assert_eq!(error.message, "Invalid message format");

        peer.outgoing.send(vec![9, 0, 0]).await.unwrap();
        assert_eq!(next_error(&mut peer.incoming).await.message, "Unknown message type");

        peer.outgoing.send(vec![1, 15, 0]).await.unwrap();
        assert_eq!(next_error(&mut peer.incoming).await.message, "Invalid message format");

        let mut short = vec![1, 15, 0];
        short.extend_from_slice(&[0; 15]);
        peer.outgoing.send(short).await.unwrap();
        let error = next_error(&mut peer.incoming).await;
        assert_eq!(error.error_code(), Some(ErrorCode::InvalidRequestSize));
        assert_eq!(error.message, "Invalid viewport request size");

        // No viewport handler on the bus.
        let request = ViewportRequest::new(0.0, 0.0, 4.0, 4.0).encode();
        let frame = encode_frame(MessageType::ViewportRequest, &request).unwrap();
        peer.outgoing.send(frame).await.unwrap();
        let error = next_error(&mut peer.incoming).await;
        assert_eq!(error.error_code(), Some(ErrorCode::ServerError));
        assert_eq!(ctx.viewport_bridge.pending(), 0);

        drop(peer.outgoing);
        task.await.unwrap();
        assert_eq!(peer.incoming.recv().await, None);
    }

    #[tokio::test]
    async fn test_process_shutdown_ends_connection() {
        let ctx = context(Arc::new(EventBus::new()));
        let (source, sink, mut peer) = channel_transport(8);
        let connection = Connection::new(ConnectionId(2), Arc::clone(&ctx), sink);

        ctx.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), connection.run(source))
            .await
            .expect("connection stopped");
        assert!(connection.cancel_token().is_cancelled());
        assert_eq!(peer.incoming.recv().await, None);
    }
}
