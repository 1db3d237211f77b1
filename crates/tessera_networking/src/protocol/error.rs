//! # Protocol Errors
//!
//! Wire violations and their application error codes.

use thiserror::Error;

/// Application error code carried in the first byte of an error payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// Viewport request payload shorter than 16 bytes.
    InvalidRequestSize = 0x01,
    /// The server failed to produce a viewport.
    ServerError = 0x02,
    /// Malformed, oversized or unknown message.
    InvalidMessage = 0x04,
}

impl ErrorCode {
    /// Decodes a wire byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::InvalidRequestSize),
            0x02 => Some(Self::ServerError),
            0x04 => Some(Self::InvalidMessage),
            _ => None,
        }
    }
}

/// Client-facing text for [`ErrorCode::InvalidRequestSize`].
pub const MSG_INVALID_REQUEST_SIZE: &str = "Invalid viewport request size";
/// Client-facing text for [`ErrorCode::ServerError`].
pub const MSG_SERVER_ERROR: &str = "Server error processing viewport request";
/// Client-facing text for a malformed frame.
pub const MSG_INVALID_FORMAT: &str = "Invalid message format";
/// Client-facing text for an oversized frame.
pub const MSG_TOO_LARGE: &str = "Message too large";
/// Client-facing text for an unrecognised type byte.
pub const MSG_UNKNOWN_TYPE: &str = "Unknown message type";

/// Errors raised while framing or parsing messages.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Header missing or payload shorter than declared.
    #[error("invalid framing")]
    InvalidFraming,

    /// Payload too short for its message type.
    #[error("invalid payload size: expected at least {expected} bytes, got {actual}")]
    InvalidSize {
        /// Minimum length for the message type.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// Declared length exceeds the transport cap.
    #[error("declared payload of {declared} bytes exceeds maximum of {max}")]
    MessageTooLarge {
        /// Length from the header.
        declared: usize,
        /// Largest accepted payload.
        max: usize,
    },

    /// Type byte not recognised.
    #[error("unknown message type {0:#04x}")]
    UnknownMessageType(u8),

    /// Outbound payload would not fit in one frame.
    #[error("payload of {len} bytes does not fit in a frame")]
    PayloadTooLarge {
        /// Encoded length.
        len: usize,
    },
}

impl ProtocolError {
    /// Wire code reported back to the peer.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidSize { .. } => ErrorCode::InvalidRequestSize,
            Self::PayloadTooLarge { .. } => ErrorCode::ServerError,
            Self::InvalidFraming | Self::MessageTooLarge { .. } | Self::UnknownMessageType(_) => {
                ErrorCode::InvalidMessage
            }
        }
    }

    /// Message text reported back to the peer.
    #[must_use]
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::InvalidFraming => MSG_INVALID_FORMAT,
            Self::InvalidSize { .. } => MSG_INVALID_REQUEST_SIZE,
            Self::MessageTooLarge { .. } => MSG_TOO_LARGE,
            Self::UnknownMessageType(_) => MSG_UNKNOWN_TYPE,
            Self::PayloadTooLarge { .. } => MSG_SERVER_ERROR,
        }
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
