//! LOD Streamer - level-of-detail resolution service.
//!
//! This binary runs the HTTP resolve service or resolves a pyramid view once
//! from the command line.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lod_streamer::{
    config::{Cli, Command, ServeConfig, TilesConfig},
    pyramid::{layer_for_viewport, resolve_tiles, PyramidDescriptor},
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Tiles(config) => run_tiles(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("LOD Streamer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    match config.cors_origins {
        Some(ref origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: any"),
    }
    info!("  Max body size: {} bytes", config.max_body_bytes);
    if config.no_tracing {
        warn!("  Request tracing: disabled");
    }

    let router = create_router(build_router_config(&config));
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "lod_streamer=debug,tower_http=debug"
    } else {
        "lod_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_tracing(!config.no_tracing)
        .with_max_body_bytes(config.max_body_bytes);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Tiles Command
// =============================================================================

fn run_tiles(config: TilesConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    let viewport = match config.viewport() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pyramid = match load_pyramid(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tiles = match resolve_tiles(&pyramid, &viewport) {
        Ok(tiles) => tiles,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        let json = serde_json::json!({
            "layer": layer_for_viewport(&pyramid, &viewport),
            "baseLayer": pyramid.base_layer(),
            "tiles": tiles,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for tile in &tiles {
            println!("{}", tile.url);
        }
    }

    ExitCode::SUCCESS
}

fn load_pyramid(config: &TilesConfig) -> Result<PyramidDescriptor, String> {
    let text = std::fs::read_to_string(&config.pyramid)
        .map_err(|e| format!("cannot read {}: {}", config.pyramid.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("invalid pyramid descriptor {}: {}", config.pyramid.display(), e))
}
