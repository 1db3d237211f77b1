//! # Messages
//!
//! Payload layouts for the three message types.
//!
//! ```text
//! ViewportRequest  camera_x f32 | camera_y f32 | width f32 | height f32 [| world_w f32 | world_h f32]
//! ViewportData     width u8 | height u8 | tiles (3 B each, row-major) | entities (9 B each)
//! Error            code u8 | len u16 | utf-8 text
//! ```

use tessera_core::Tile;

use super::error::{ErrorCode, ProtocolError, ProtocolResult};
use super::serialization::{PayloadReader, PayloadWriter};

/// Minimum viewport request payload.
pub const VIEWPORT_REQUEST_LEN: usize = 16;

/// Viewport request payload carrying world-size hints.
pub const VIEWPORT_REQUEST_WITH_HINTS_LEN: usize = 24;

/// Bytes per tile record.
pub const TILE_RECORD_LEN: usize = 3;

/// Bytes per entity record.
pub const ENTITY_RECORD_LEN: usize = 9;

/// Bytes before the tile grid in a viewport payload.
pub const VIEWPORT_DATA_HEADER_LEN: usize = 2;

/// A client's camera rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportRequest {
    /// Camera centre X, world tiles.
    pub camera_x: f32,
    /// Camera centre Y, world tiles.
    pub camera_y: f32,
    /// Requested width in tiles.
    pub viewport_width: f32,
    /// Requested height in tiles.
    pub viewport_height: f32,
    /// Optional world width hint.
    pub world_width: Option<f32>,
    /// Optional world height hint.
    pub world_height: Option<f32>,
}

impl ViewportRequest {
    /// Request without world hints.
    #[must_use]
    pub const fn new(camera_x: f32, camera_y: f32, viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            camera_x,
            camera_y,
            viewport_width,
            viewport_height,
            world_width: None,
            world_height: None,
        }
    }

    /// Adds world-size hints.
    #[must_use]
    pub const fn with_world_hints(mut self, world_width: f32, world_height: f32) -> Self {
        self.world_width = Some(world_width);
        self.world_height = Some(world_height);
        self
    }

    /// Encodes to 16 bytes, or 24 when both hints are present.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = PayloadWriter::with_capacity(VIEWPORT_REQUEST_WITH_HINTS_LEN);
        for value in [self.camera_x, self.camera_y, self.viewport_width, self.viewport_height] {
            writer.write_f32(value);
        }
        if let (Some(w), Some(h)) = (self.world_width, self.world_height) {
            writer.write_f32(w);
            writer.write_f32(h);
        }
        writer.into_inner()
    }

    /// Decodes a request payload.
    ///
    /// Payloads of 16 to 23 bytes carry no hints; 24 or more carry both.
    ///
    /// # Errors
    ///
    /// `InvalidSize` for payloads under 16 bytes.
    pub fn decode(payload: &[u8]) -> ProtocolResult<Self> {
        let too_short = ProtocolError::InvalidSize {
            expected: VIEWPORT_REQUEST_LEN,
            actual: payload.len(),
        };
        let mut reader = PayloadReader::new(payload);
        let mut next = || reader.read_f32().ok_or(too_short);

        let mut request = Self::new(next()?, next()?, next()?, next()?);
        if payload.len() >= VIEWPORT_REQUEST_WITH_HINTS_LEN {
            request.world_width = Some(next()?);
            request.world_height = Some(next()?);
        }
        Ok(request)
    }
}

/// One entity inside a viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityRecord {
    /// Column inside the viewport.
    pub x: u8,
    /// Row inside the viewport.
    pub y: u8,
    /// Wire id.
    pub id: i32,
    /// Action byte.
    pub action: u8,
    /// Entity type byte.
    pub kind: u8,
    /// Facing byte.
    pub direction: u8,
}

impl EntityRecord {
    fn write(&self, writer: &mut PayloadWriter) -> bool {
        writer.write_u8(self.x)
            && writer.write_u8(self.y)
            && writer.write_i32(self.id)
            && writer.write_u8(self.action)
            && writer.write_u8(self.kind)
            && writer.write_u8(self.direction)
    }

    fn read(reader: &mut PayloadReader<'_>) -> Option<Self> {
        Some(Self {
            x: reader.read_u8()?,
            y: reader.read_u8()?,
            id: reader.read_i32()?,
            action: reader.read_u8()?,
            kind: reader.read_u8()?,
            direction: reader.read_u8()?,
        })
    }
}

/// Tiles and entities for one viewport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewportData {
    /// Grid width.
    pub width: u8,
    /// Grid height.
    pub height: u8,
    /// `width * height` tiles, row-major.
    pub tiles: Vec<Tile>,
    /// Entities inside the rectangle.
    pub entities: Vec<EntityRecord>,
}

impl ViewportData {
    /// Encoded payload length, ignoring the frame cap.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        VIEWPORT_DATA_HEADER_LEN
            + self.tiles.len() * TILE_RECORD_LEN
            + self.entities.len() * ENTITY_RECORD_LEN
    }

    /// Encodes the payload.
    ///
    /// Entities that do not fit after the tile grid are dropped.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` when the tile grid alone exceeds a frame.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let mut writer = PayloadWriter::with_capacity(self.encoded_len());
        let fits = writer.write_u8(self.width)
            && writer.write_u8(self.height)
            && self
                .tiles
                .iter()
                .all(|t| writer.write_bytes(&[t.material, t.surface, t.properties]));
        if !fits {
            return Err(ProtocolError::PayloadTooLarge {
                len: self.encoded_len(),
            });
        }

        let capacity = writer.remaining() / ENTITY_RECORD_LEN;
        if self.entities.len() > capacity {
            tracing::warn!(
                entities = self.entities.len(),
                kept = capacity,
                "viewport entity list truncated to fit frame"
            );
        }
        for entity in self.entities.iter().take(capacity) {
            entity.write(&mut writer);
        }
        Ok(writer.into_inner())
    }

    /// Decodes a viewport payload.
    ///
    /// # Errors
    ///
    /// `InvalidSize` when the tile grid is truncated, `InvalidFraming` when
    /// the entity run is not a whole number of records.
    pub fn decode(payload: &[u8]) -> ProtocolResult<Self> {
        let mut reader = PayloadReader::new(payload);
        let (Some(width), Some(height)) = (reader.read_u8(), reader.read_u8()) else {
            return Err(ProtocolError::InvalidSize {
                expected: VIEWPORT_DATA_HEADER_LEN,
                actual: payload.len(),
            });
        };

        let cells = usize::from(width) * usize::from(height);
        let grid = reader.read_bytes(cells * TILE_RECORD_LEN).ok_or(ProtocolError::InvalidSize {
            expected: VIEWPORT_DATA_HEADER_LEN + cells * TILE_RECORD_LEN,
            actual: payload.len(),
        })?;
        let tiles = grid
            .chunks_exact(TILE_RECORD_LEN)
            .map(|t| Tile::new(t[0], t[1], t[2]))
            .collect();

        if reader.remaining() % ENTITY_RECORD_LEN != 0 {
            return Err(ProtocolError::InvalidFraming);
        }
        let mut entities = Vec::with_capacity(reader.remaining() / ENTITY_RECORD_LEN);
        while let Some(entity) = EntityRecord::read(&mut reader) {
            entities.push(entity);
        }

        Ok(Self {
            width,
            height,
            tiles,
            entities,
        })
    }

    /// Tile at viewport cell `(x, y)`.
    #[must_use]
    pub fn tile(&self, x: u8, y: u8) -> Option<Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }
}

/// Error payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Raw code byte.
    pub code: u8,
    /// Human-readable text.
    pub message: String,
}

impl ErrorMessage {
    /// Builds an error for a known code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as u8,
            message: message.into(),
        }
    }

    /// Known code, if any.
    #[must_use]
    pub const fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u8(self.code)
    }

    /// Encodes the payload. Text longer than a frame allows is cut at a
    /// character boundary.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let limit = usize::from(u16::MAX).min(super::frame::MAX_PAYLOAD_LEN - 3);
        let mut end = self.message.len().min(limit);
        while !self.message.is_char_boundary(end) {
            end -= 1;
        }
        let text = &self.message.as_bytes()[..end];

        let mut writer = PayloadWriter::with_capacity(3 + text.len());
        writer.write_u8(self.code);
        writer.write_u16(u16::try_from(text.len()).unwrap_or(u16::MAX));
        writer.write_bytes(text);
        writer.into_inner()
    }

    /// Decodes an error payload.
    ///
    /// # Errors
    ///
    /// `InvalidSize` under three bytes, `InvalidFraming` when the declared
    /// text runs past the payload.
    pub fn decode(payload: &[u8]) -> ProtocolResult<Self> {
        let mut reader = PayloadReader::new(payload);
        let (Some(code), Some(len)) = (reader.read_u8(), reader.read_u16()) else {
            return Err(ProtocolError::InvalidSize {
                expected: 3,
                actual: payload.len(),
            });
        };
        let text = reader
            .read_bytes(usize::from(len))
            .ok_or(ProtocolError::InvalidFraming)?;
        Ok(Self {
            code,
            message: String::from_utf8_lossy(text).into_owned(),
        })
    }
}
