//! # Tile Server
//!
//! Wires the shared state, the tick thread and the network tasks together.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        TILE SERVER                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   EventBus    ┌──────────────────────┐     │
//! │  │ Connections  │──────────────▶│ Tick thread          │     │
//! │  │ (tokio)      │◀──────────────│ systems → managers   │     │
//! │  └──────────────┘   Bridges     └──────────┬───────────┘     │
//! │                                            │                 │
//! │                  ┌─────────────────────────▼───────────┐     │
//! │                  │ World (chunks) + EntityRegistry     │     │
//! │                  └─────────────────────────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod managers;
mod tick;

pub use config::{ConfigError, ServerConfig, WorldConfig};
pub use managers::{MapManager, ViewportManager};
pub use tick::{ComponentKind, Lifecycle, LifecycleError, TickFailure, TickScheduler, TickStats};

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use tessera_core::{EntityRegistry, Tile, World, WorldResult};
use tessera_procedural::{GenerationReport, GeneratorMode, NoiseSeed, WorldGenerator};
use tokio::net::TcpListener;

use crate::bridge::CorrelationBridge;
use crate::connection::{Connection, ConnectionId, SessionContext};
use crate::events::EventBus;
use crate::protocol::ViewportData;
use crate::shutdown::ShutdownToken;
use crate::transport::{split_tcp, FrameSink, FrameSource};
use crate::viewport::ViewportExtractor;

/// The tile world server.
pub struct TileServer {
    config: ServerConfig,
    world: Arc<World>,
    entities: Arc<EntityRegistry>,
    bus: Arc<EventBus>,
    viewport_bridge: Arc<CorrelationBridge<ViewportData>>,
    tile_bridge: Arc<CorrelationBridge<WorldResult<Tile>>>,
    shutdown: ShutdownToken,
    next_connection: AtomicU64,
}

impl TileServer {
    /// Creates a server with an empty world.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let world = Arc::new(World::new(config.world.size_in_chunks));
        Self {
            config,
            world,
            entities: Arc::new(EntityRegistry::new()),
            bus: Arc::new(EventBus::new()),
            viewport_bridge: Arc::new(CorrelationBridge::new()),
            tile_bridge: Arc::new(CorrelationBridge::new()),
            shutdown: ShutdownToken::new(),
            next_connection: AtomicU64::new(1),
        }
    }

    /// Generates every chunk. Call once, before the tick thread starts.
    ///
    /// # Errors
    ///
    /// Store errors from chunk installation.
    pub fn generate_world(&self) -> WorldResult<GenerationReport> {
        let mode = if self.config.world.flat {
            GeneratorMode::Flat
        } else {
            GeneratorMode::Terrain
        };
        WorldGenerator::with_seed(NoiseSeed::new(self.config.world.seed))
            .with_mode(mode)
            .generate(&self.world)
    }

    /// Scheduler with the standard managers registered.
    #[must_use]
    pub fn build_scheduler(&self) -> TickScheduler {
        let mut scheduler = TickScheduler::new(self.config.tick_interval(), self.config.settle_delay());
        scheduler.add_manager(Box::new(MapManager::new(
            &self.bus,
            Arc::clone(&self.world),
            Arc::clone(&self.tile_bridge),
        )));
        scheduler.add_manager(Box::new(ViewportManager::new(
            &self.bus,
            ViewportExtractor::new(Arc::clone(&self.world), Arc::clone(&self.entities)),
            Arc::clone(&self.viewport_bridge),
        )));
        scheduler
    }

    /// Starts `scheduler` on its own thread.
    ///
    /// A failed `init_all` or a panic inside the loop is fatal: it is logged,
    /// the components are torn down, the process shutdown token fires and the
    /// thread returns the failure.
    ///
    /// # Errors
    ///
    /// The thread could not be spawned.
    pub fn spawn_tick_thread(
        &self,
        mut scheduler: TickScheduler,
    ) -> std::io::Result<JoinHandle<Result<(), TickFailure>>> {
        let shutdown = self.shutdown.clone();
        std::thread::Builder::new()
            .name("tessera-tick".to_owned())
            .spawn(move || {
                let outcome = match scheduler.init_all() {
                    Ok(()) => panic::catch_unwind(AssertUnwindSafe(|| scheduler.run(&shutdown)))
                        .map_err(|payload| TickFailure::from_panic(payload.as_ref())),
                    Err(e) => Err(TickFailure::from(e)),
                };
                if let Err(e) = &outcome {
                    tracing::error!(error = %e, "tick thread failed");
                    scheduler.shutdown();
                    shutdown.cancel();
                }
                outcome
            })
    }

    /// Waits for the tick thread and reports how it ended.
    ///
    /// # Errors
    ///
    /// The failure the thread returned, or its panic if it escaped.
    pub fn join_tick_thread(handle: JoinHandle<Result<(), TickFailure>>) -> Result<(), TickFailure> {
        handle
            .join()
            .unwrap_or_else(|payload| Err(TickFailure::from_panic(payload.as_ref())))
    }

    /// Context handed to each connection.
    #[must_use]
    pub fn session_context(&self) -> Arc<SessionContext> {
        Arc::new(SessionContext {
            bus: Arc::clone(&self.bus),
            viewport_bridge: Arc::clone(&self.viewport_bridge),
            refresh_interval: self.config.refresh_interval(),
            shutdown: self.shutdown.clone(),
        })
    }

    /// Creates a connection over an arbitrary transport.
    #[must_use]
    pub fn connect<S: FrameSink>(&self, sink: S) -> Connection<S> {
        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
        Connection::new(id, self.session_context(), sink)
    }

    /// Spawns a task serving `source`/`sink`.
    pub fn spawn_connection<R, S>(&self, source: R, sink: S) -> tokio::task::JoinHandle<()>
    where
        R: FrameSource + 'static,
        S: FrameSink + 'static,
    {
        let connection = self.connect(sink);
        tokio::spawn(async move { connection.run(source).await })
    }

    /// Accepts TCP clients until the shutdown token fires.
    ///
    /// # Errors
    ///
    /// Listener failure.
    pub async fn serve_tcp(&self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "listening");
        loop {
            let accepted = tokio::select! {
                () = self.shutdown.cancelled() => return Ok(()),
                accepted = listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!(%peer, error = %e, "set_nodelay failed");
                    }
                    let (source, sink) = split_tcp(stream);
                    tracing::info!(%peer, "client accepted");
                    drop(self.spawn_connection(source, sink));
                }
                Err(e) => tracing::warn!(error = %e, "accept failed"),
            }
        }
    }

    /// Process shutdown token.
    #[must_use]
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Shared world.
    #[must_use]
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Shared entity registry.
    #[must_use]
    pub fn entities(&self) -> &Arc<EntityRegistry> {
        &self.entities
    }

    /// Event bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Tile query bridge.
    #[must_use]
    pub fn tile_bridge(&self) -> &Arc<CorrelationBridge<WorldResult<Tile>>> {
        &self.tile_bridge
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }
}
