//! Configuration management for LOD Streamer.
//!
//! Two subcommands are available:
//! - `serve`: run the HTTP resolve service
//! - `tiles`: resolve the visible tiles of a pyramid descriptor once and print them
//!
//! # Environment Variables
//!
//! Server options can also be set via environment variables with the `LOD_` prefix:
//!
//! - `LOD_HOST` - Server bind address (default: 0.0.0.0)
//! - `LOD_PORT` - Server port (default: 3000)
//! - `LOD_CORS_ORIGINS` - Allowed CORS origins, comma separated (default: any)
//! - `LOD_MAX_BODY_BYTES` - Maximum request body size (default: 8 MiB)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::geometry::{Aabb2, ScreenSize, Viewport};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default request body limit (8 MiB). Spatial trees are posted whole.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

// =============================================================================
// CLI Arguments
// =============================================================================

/// LOD Streamer - level-of-detail resolution for tiled, multiscale and
/// spatial-tree datasets.
#[derive(Parser, Debug, Clone)]
#[command(name = "lod-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP resolve service.
    Serve(ServeConfig),

    /// Print the tiles of a pyramid visible in a view.
    Tiles(TilesConfig),
}

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "LOD_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "LOD_PORT")]
    pub port: u16,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "LOD_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Maximum accepted request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "LOD_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty. Set --host or LOD_HOST".to_string());
        }

        if self.max_body_bytes < 1024 {
            return Err("max_body_bytes must be at least 1KB".to_string());
        }

        if let Some(ref origins) = self.cors_origins {
            if origins.iter().any(|o| o.trim().is_empty()) {
                return Err("cors_origins must not contain empty entries".to_string());
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Args, Debug, Clone)]
pub struct TilesConfig {
    /// Pyramid descriptor JSON file.
    #[arg(long)]
    pub pyramid: PathBuf,

    /// View box in parametric image coordinates ([0,1] on both axes): x0,y0,x1,y1.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub view: Vec<f64>,

    /// Screen size in pixels: width,height.
    #[arg(long, value_delimiter = ',')]
    pub screen: Vec<f64>,

    /// Print tiles as JSON instead of one URL per line.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl TilesConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.view.len() != 4 {
            return Err(format!(
                "--view takes 4 comma-separated values (x0,y0,x1,y1), got {}",
                self.view.len()
            ));
        }
        if self.screen.len() != 2 {
            return Err(format!(
                "--screen takes 2 comma-separated values (width,height), got {}",
                self.screen.len()
            ));
        }
        Ok(())
    }

    /// Build the viewport from `--view` and `--screen`.
    ///
    /// Corners may be given in any order.
    pub fn viewport(&self) -> Result<Viewport, String> {
        self.validate()?;
        let view = Aabb2::from_corners([self.view[0], self.view[1]], [self.view[2], self.view[3]]);
        let screen = ScreenSize::new(self.screen[0], self.screen[1]);
        Viewport::new(view, screen).map_err(|e| e.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
