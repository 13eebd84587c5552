//! CLI definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use truckgate_types::OutputFormat;

#[derive(Parser)]
#[command(name = "truckgate")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Truck gate intake: plate recognition, admission queue and announcements")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a plate frame from the gate camera
    Capture,

    /// Register a truck and put it in the gate queue
    Intake {
        /// Captured plate image (path, or file name in the upload folder)
        #[arg(long, short = 'p', conflicts_with = "capture")]
        plate: Option<PathBuf>,

        /// Driving license document
        #[arg(long, short = 'l')]
        license: Option<PathBuf>,

        /// Challan document
        #[arg(long, short = 'c')]
        challan: Option<PathBuf>,

        /// Grab the plate frame from the camera first
        #[arg(long)]
        capture: bool,
    },

    /// Read the plate number from an image without queueing
    Recognize {
        /// Path to image file
        image: PathBuf,

        /// Skip cache lookup (overrides config)
        #[arg(long)]
        no_cache: bool,
    },

    /// Admit the next queued truck and announce it
    Gate,

    /// List trucks waiting at the gate
    Queue,

    /// List every truck record
    History,

    /// Announce a truck again and rewrite its audio file
    Announce {
        /// Truck number as registered
        truck_number: String,
    },

    /// Print the announcement audio path for a truck
    Artifact {
        /// Truck number as registered
        truck_number: String,
    },

    /// Manage plate reading cache
    Cache {
        /// Clear all cache
        #[arg(long)]
        clear: bool,

        /// Show cache statistics
        #[arg(long)]
        stats: bool,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set a value, e.g. `--set camera_url=rtsp://10.0.0.5/stream`
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
