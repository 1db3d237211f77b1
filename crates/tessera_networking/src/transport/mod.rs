//! # Frame Transports
//!
//! A connection only needs whole, ordered frames in and out. Anything that
//! can deliver that implements [`FrameSource`] and [`FrameSink`]:
//!
//! - [`channel`]: in-process tokio queues, one message per frame
//! - [`tcp`]: a byte stream re-split on frame headers

pub mod channel;
pub mod tcp;

use std::future::Future;

use thiserror::Error;

pub use channel::{channel_transport, ChannelPeer, ChannelSink, ChannelSource};
pub use tcp::{split_tcp, TcpFrameSink, TcpFrameSource};

/// Transport failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The other end went away.
    #[error("transport closed")]
    Closed,

    /// Socket error.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inbound half.
pub trait FrameSource: Send {
    /// Next whole frame, or `None` once the peer has closed.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;
}

/// Outbound half.
pub trait FrameSink: Send {
    /// Sends one whole frame.
    fn send(&mut self, frame: Vec<u8>) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Closes the outbound direction.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
