//! # TESSERA Tile Server
//!
//! Generates the world, starts the tick thread and serves viewport
//! requests over TCP until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! tessera_server [config.toml]
//! RUST_LOG=tessera_networking=debug tessera_server server.toml
//! ```

use std::process::ExitCode;
use std::time::Duration;

use tessera_networking::{ServerConfig, TileServer};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(%path, error = %e, "cannot load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

fn run(config: ServerConfig) -> std::io::Result<()> {
    tracing::info!(
        bind_addr = %config.bind_addr,
        size_in_chunks = config.world.size_in_chunks,
        seed = config.world.seed,
        flat = config.world.flat,
        "starting"
    );

    let server = TileServer::new(config);

    let report = server.generate_world().map_err(std::io::Error::other)?;
    tracing::info!(chunks = report.chunks, elapsed_ms = report.elapsed_ms, "world generated");

    let tick = server.spawn_tick_thread(server.build_scheduler())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tessera-net")
        .build()?;

    let served = runtime.block_on(async {
        let listener = TcpListener::bind(&server.config().bind_addr).await?;
        tokio::select! {
            served = server.serve_tcp(listener) => served,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                }
                tracing::info!("shutdown requested");
                Ok(())
            }
        }
    });

    server.shutdown_token().cancel();
    let ticked = TileServer::join_tick_thread(tick).map_err(std::io::Error::other);
    runtime.shutdown_timeout(Duration::from_secs(1));
    tracing::info!("stopped");
    ticked.and(served)
}
