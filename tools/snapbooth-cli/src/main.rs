//! SnapBooth CLI: run a photobooth session from the terminal.
//!
//! Usage:
//!   snapbooth shoot [OPTIONS]           Run a timed capture sequence and export
//!   snapbooth compose <IMAGES>...       Composite already-captured images
//!   snapbooth catalog                   List layouts, frames and filters
//!   snapbooth check [--write-config]    Check fonts and configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use snapbooth_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "snapbooth",
    about = "Photobooth sessions: countdown, capture, composite",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Look of the composite.
#[derive(Args, Debug, Clone)]
pub struct StyleArgs {
    /// Frame style id (white, black, cream, pink, blue, gradient)
    #[arg(long)]
    frame: Option<String>,

    /// Filter name, or a custom chain such as "sepia(30%) contrast(110%)"
    #[arg(long)]
    filter: Option<String>,

    /// Brightness in percent [50, 150]
    #[arg(long)]
    brightness: Option<u32>,

    /// Caption shown in the header, at most 25 characters
    #[arg(long)]
    caption: Option<String>,

    /// Output directory (defaults to the configured export directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a capture sequence and export the composite
    Shoot {
        /// Image directory, single image, or "pattern" for a synthetic camera
        #[arg(short, long, default_value = "pattern")]
        source: String,

        /// Layout id (strip-4, wide-3, grid-4, grid-6, solo)
        #[arg(short, long)]
        layout: Option<String>,

        /// Countdown seconds per shot (3, 5 or 10)
        #[arg(short, long)]
        countdown: Option<u32>,

        /// Skip the real-time waits
        #[arg(long)]
        instant: bool,

        /// Keep frames unflipped
        #[arg(long)]
        no_mirror: bool,

        /// Try once more when the camera has no frame
        #[arg(long)]
        retry_missed: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Composite existing images
    Compose {
        /// Images in display order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Layout id (strip-4, wide-3, grid-4, grid-6, solo)
        #[arg(short, long)]
        layout: Option<String>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// List the layout, frame and filter catalogs
    Catalog {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check fonts and configuration
    Check {
        /// Write the effective configuration to the config file
        #[arg(long)]
        write_config: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    snapbooth_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Shoot {
            source,
            layout,
            countdown,
            instant,
            no_mirror,
            retry_missed,
            style,
        } => {
            commands::shoot::run(
                &config,
                commands::shoot::ShootOptions {
                    source,
                    layout,
                    countdown,
                    instant,
                    mirror: !no_mirror,
                    retry_missed,
                    style,
                },
            )
            .await
        }
        Commands::Compose {
            images,
            layout,
            style,
        } => commands::compose::run(&config, images, layout, style).await,
        Commands::Catalog { json } => commands::catalog::run(json),
        Commands::Check { write_config } => commands::check::run(&config, write_config),
    }
}
