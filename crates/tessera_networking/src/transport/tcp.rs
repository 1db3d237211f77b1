//! TCP transport. Frames are re-split from the stream using their header.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::{FrameSink, FrameSource, TransportError};
use crate::protocol::{FrameHeader, FRAME_HEADER_LEN};

/// Reads frames off a TCP stream.
#[derive(Debug)]
pub struct TcpFrameSource {
    reader: OwnedReadHalf,
}

/// Writes frames to a TCP stream.
#[derive(Debug)]
pub struct TcpFrameSink {
    writer: OwnedWriteHalf,
}

/// Splits a connected stream into frame halves.
#[must_use]
pub fn split_tcp(stream: TcpStream) -> (TcpFrameSource, TcpFrameSink) {
    let (reader, writer) = stream.into_split();
    (TcpFrameSource { reader }, TcpFrameSink { writer })
}

impl FrameSource for TcpFrameSource {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        // Clean EOF only between frames.
        let first = self.reader.read(&mut header[..1]).await?;
        if first == 0 {
            return Ok(None);
        }
        self.reader.read_exact(&mut header[1..]).await?;

        // Oversized declarations are still read through so the stream stays
        // aligned; the connection rejects the frame after.
        let declared = FrameHeader {
            message_type: header[0],
            length: u16::from_le_bytes([header[1], header[2]]),
        }
        .payload_len();
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + declared);
        frame.extend_from_slice(&header);
        frame.resize(FRAME_HEADER_LEN + declared, 0);
        self.reader.read_exact(&mut frame[FRAME_HEADER_LEN..]).await?;
        Ok(Some(frame))
    }
}

impl FrameSink for TcpFrameSink {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.writer.write_all(&frame).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_frames_resplit_from_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            // Two frames in one write.
            stream.write_all(&[3, 2, 0, 0xAA, 0xBB, 2, 0, 0]).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        let (stream, _) = listener.accept().await.unwrap();
        let (mut source, _sink) = split_tcp(stream);
        assert_eq!(source.recv().await.unwrap(), Some(vec![3, 2, 0, 0xAA, 0xBB]));
        assert_eq!(source.recv().await.unwrap(), Some(vec![2, 0, 0]));
        assert_eq!(source.recv().await.unwrap(), None);
        client.await.unwrap();
    }
}
