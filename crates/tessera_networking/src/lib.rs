//! # TESSERA Networking - Viewport Sync
//!
//! Everything between the tile store and a remote client.
//!
//! ## Architecture
//!
//! - **Protocol**: length-prefixed binary frames, 64 KiB cap, little-endian
//! - **Viewport**: camera rectangle to tile grid plus entities, sentinel off-world
//! - **Bridge**: callback ids pairing bus requests with their results
//! - **Scheduler**: one tick thread driving systems then managers
//! - **Connections**: a receive loop and a refresh loop per client
//!
//! ## Request Path
//!
//! ```text
//! CLIENT                 CONNECTION TASK              TICK THREAD
//!   |-- ViewportRequest -->|                              |
//!   |                      |-- bus: ViewportRequest{id} ->|
//!   |                      |                              | extract from World
//!   |                      |<-- bridge.resolve(id) -------|
//!   |<-- ViewportData -----|                              |
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_networking::{ServerConfig, TileServer};
//!
//! let server = TileServer::new(ServerConfig::default());
//! server.generate_world()?;
//! let tick = server.spawn_tick_thread(server.build_scheduler())?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bridge;
pub mod connection;
pub mod events;
pub mod protocol;
pub mod server;
pub mod shutdown;
pub mod transport;
pub mod viewport;

pub use bridge::{CallbackId, CorrelationBridge};
pub use connection::{Connection, ConnectionId, SessionContext};
pub use events::{EventBus, EventKind, ViewportQuery, WorldEvent};
pub use protocol::{
    decode_frame, encode_frame, EntityRecord, ErrorCode, ErrorMessage, MessageType, ProtocolError,
    ViewportData, ViewportRequest, MAX_MESSAGE_SIZE,
};
pub use server::{
    ConfigError, Lifecycle, LifecycleError, MapManager, ServerConfig, TickFailure, TickScheduler,
    TickStats, TileServer, ViewportManager, WorldConfig,
};
pub use shutdown::ShutdownToken;
pub use transport::{channel_transport, FrameSink, FrameSource, TransportError};
pub use viewport::{ViewportExtractor, ViewportWindow};
