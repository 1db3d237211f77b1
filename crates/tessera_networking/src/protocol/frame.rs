//! # Framing
//!
//! ```text
//! byte 0    : message type
//! bytes 1-2 : payload length, u16 LE
//! bytes 3.. : payload
//! ```

use super::error::{ProtocolError, ProtocolResult};

/// Header size in bytes.
pub const FRAME_HEADER_LEN: usize = 3;

/// Largest message the transport carries, header included.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Largest payload a frame may declare.
pub const MAX_PAYLOAD_LEN: usize = MAX_MESSAGE_SIZE - FRAME_HEADER_LEN;

/// Message type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Client asks for a viewport.
    ViewportRequest = 1,
    /// Server sends tiles and entities.
    ViewportData = 2,
    /// Either side reports a failure.
    Error = 3,
}

impl MessageType {
    /// Decodes a type byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ViewportRequest),
            2 => Some(Self::ViewportData),
            3 => Some(Self::Error),
            _ => None,
        }
    }
}

/// Decoded frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Raw type byte.
    pub message_type: u8,
    /// Declared payload length.
    pub length: u16,
}

impl FrameHeader {
    /// Parses the first three bytes of `bytes`.
    ///
    /// # Errors
    ///
    /// `InvalidFraming` when fewer than three bytes are present.
    pub fn parse(bytes: &[u8]) -> ProtocolResult<Self> {
        match bytes {
            [message_type, lo, hi, ..] => Ok(Self {
                message_type: *message_type,
                length: u16::from_le_bytes([*lo, *hi]),
            }),
            _ => Err(ProtocolError::InvalidFraming),
        }
    }

    /// Encoded header.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; FRAME_HEADER_LEN] {
        let [lo, hi] = self.length.to_le_bytes();
        [self.message_type, lo, hi]
    }

    /// Declared payload length as `usize`.
    #[must_use]
    pub fn payload_len(self) -> usize {
        usize::from(self.length)
    }
}

/// A decoded frame borrowing its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Message type.
    pub message_type: MessageType,
    /// Exactly the declared payload bytes.
    pub payload: &'a [u8],
}

/// Wraps `payload` in a frame.
///
/// # Errors
///
/// `PayloadTooLarge` when the payload exceeds [`MAX_PAYLOAD_LEN`].
pub fn encode_frame(message_type: MessageType, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge { len: payload.len() });
    }
    let length = u16::try_from(payload.len())
        .map_err(|_| ProtocolError::PayloadTooLarge { len: payload.len() })?;

    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    out.extend_from_slice(
        &FrameHeader {
            message_type: message_type as u8,
            length,
        }
        .to_bytes(),
    );
    out.extend_from_slice(payload);
    Ok(out)
}

/// Splits one frame into type and payload.
///
/// Checks run in order: header present, declared length within the cap,
/// declared length available, known type. Bytes past the declared payload
/// are ignored.
///
/// # Errors
///
/// See the check order above.
pub fn decode_frame(bytes: &[u8]) -> ProtocolResult<Frame<'_>> {
    let header = FrameHeader::parse(bytes)?;
    let declared = header.payload_len();

    if declared > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::MessageTooLarge {
            declared,
            max: MAX_PAYLOAD_LEN,
        });
    }

    let payload = bytes
        .get(FRAME_HEADER_LEN..FRAME_HEADER_LEN + declared)
        .ok_or(ProtocolError::InvalidFraming)?;

    let message_type = MessageType::from_u8(header.message_type)
        .ok_or(ProtocolError::UnknownMessageType(header.message_type))?;

    Ok(Frame {
        message_type,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let frame = encode_frame(MessageType::Error, &[9, 8, 7]).unwrap();
        assert_eq!(frame, vec![3, 3, 0, 9, 8, 7]);
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.message_type, MessageType::Error);
        assert_eq!(decoded.payload, &[9, 8, 7]);
    }

    #[test]
    fn test_short_header_is_invalid_framing() {
        assert_eq!(decode_frame(&[]), Err(ProtocolError::InvalidFraming));
        assert_eq!(decode_frame(&[1, 0]), Err(ProtocolError::InvalidFraming));
    }

    #[test]
    fn test_truncated_payload_is_invalid_framing() {
        assert_eq!(decode_frame(&[1, 4, 0, 1, 2]), Err(ProtocolError::InvalidFraming));
    }

    #[test]
    fn test_oversized_declaration_rejected_before_payload() {
        // Only the header is present; the length check must fire first.
        let header = FrameHeader {
            message_type: 1,
            length: u16::MAX,
        }
        .to_bytes();
        assert_eq!(
            decode_frame(&header),
            Err(ProtocolError::MessageTooLarge {
                declared: 65_535,
                max: MAX_PAYLOAD_LEN
            })
        );
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            decode_frame(&[0x7F, 0, 0]),
            Err(ProtocolError::UnknownMessageType(0x7F))
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let decoded = decode_frame(&[2, 1, 0, 5, 6, 7]).unwrap();
        assert_eq!(decoded.payload, &[5]);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            encode_frame(MessageType::ViewportData, &payload),
            Err(ProtocolError::PayloadTooLarge {
                len: MAX_PAYLOAD_LEN + 1
            })
        );
        assert!(encode_frame(MessageType::ViewportData, &payload[..MAX_PAYLOAD_LEN]).is_ok());
    }
}
