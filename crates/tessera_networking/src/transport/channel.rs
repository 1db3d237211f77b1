//! In-process transport over tokio mpsc queues.

use tokio::sync::mpsc;

use super::{FrameSink, FrameSource, TransportError};

/// Server-side inbound half.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

/// Server-side outbound half.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Option<mpsc::Sender<Vec<u8>>>,
}

/// The client's end of a channel transport.
#[derive(Debug)]
pub struct ChannelPeer {
    /// Frames towards the server. Dropping it closes the server's source.
    pub outgoing: mpsc::Sender<Vec<u8>>,
    /// Frames from the server. Yields `None` once the server closes.
    pub incoming: mpsc::Receiver<Vec<u8>>,
}

/// Creates a transport with `capacity` frames of buffering each way.
#[must_use]
pub fn channel_transport(capacity: usize) -> (ChannelSource, ChannelSink, ChannelPeer) {
    let (to_server, from_client) = mpsc::channel(capacity);
    let (to_client, from_server) = mpsc::channel(capacity);
    (
        ChannelSource { rx: from_client },
        ChannelSink { tx: Some(to_client) },
        ChannelPeer {
            outgoing: to_server,
            incoming: from_server,
        },
    )
}

impl FrameSource for ChannelSource {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame).await.map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}
