// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::FacingMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Camera session and still capture on a software camera")]
#[command(version, long_version = env!("PHOTOBOOTH_BUILD_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo
    Photo {
        /// Camera to use (front or rear)
        #[arg(short, long)]
        facing: Option<FacingMode>,

        /// Output directory (default: ~/Pictures/photobooth)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a camera negotiation and print every session event
    Simulate {
        /// Camera to request (front or rear)
        #[arg(short, long)]
        facing: Option<FacingMode>,

        /// Refuse camera permission
        #[arg(long)]
        deny_permission: bool,

        /// Largest width the emulated sensor supports
        #[arg(long, default_value = "3840")]
        max_width: u32,

        /// Largest height the emulated sensor supports
        #[arg(long, default_value = "2160")]
        max_height: u32,

        /// Emulate a device that never delivers a frame
        #[arg(long)]
        stall: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = photobooth::Config::load()?;

    match cli.command {
        Commands::List => cli::list_cameras().await,
        Commands::Photo { facing, output } => cli::take_photo(&config, facing, output).await,
        Commands::Simulate {
            facing,
            deny_permission,
            max_width,
            max_height,
            stall,
        } => {
            let options = cli::SimulateOptions {
                facing: facing.unwrap_or(config.initial_facing),
                deny_permission,
                max_width,
                max_height,
                stall,
            };
            cli::simulate(&config, options).await
        }
    }
}
