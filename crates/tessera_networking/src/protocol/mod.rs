//! # Viewport Sync Protocol
//!
//! Length-prefixed binary frames, all integers little-endian.
//!
//! ## Message Flow
//!
//! ```text
//! CLIENT                                SERVER
//!   |--- ViewportRequest (1) ----------->|
//!   |<-- ViewportData (2) ---------------|   then every refresh interval
//!   |<-- Error (3) ----------------------|   on any rejected frame
//! ```
//!
//! Protocol violations are answered with an error frame; the connection
//! stays open.

mod error;
mod frame;
mod messages;
mod serialization;

pub use error::{
    ErrorCode, ProtocolError, ProtocolResult, MSG_INVALID_FORMAT, MSG_INVALID_REQUEST_SIZE,
    MSG_SERVER_ERROR, MSG_TOO_LARGE, MSG_UNKNOWN_TYPE,
};
pub use frame::{
    decode_frame, encode_frame, Frame, FrameHeader, MessageType, FRAME_HEADER_LEN, MAX_MESSAGE_SIZE,
    MAX_PAYLOAD_LEN,
};
pub use messages::{
    EntityRecord, ErrorMessage, ViewportData, ViewportRequest, ENTITY_RECORD_LEN, TILE_RECORD_LEN,
    VIEWPORT_DATA_HEADER_LEN, VIEWPORT_REQUEST_LEN, VIEWPORT_REQUEST_WITH_HINTS_LEN,
};
pub use serialization::{PayloadReader, PayloadWriter};
