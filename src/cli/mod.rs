//! CLI interface for musicbox

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Play a sensor board as a MIDI instrument
#[derive(Parser)]
#[command(name = "musicbox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read sensor frames and play them
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "musicbox.yaml")]
        config: PathBuf,

        /// Input device, capture file, or "-" for stdin (overrides the configuration)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// MIDI output port name or substring (overrides the configuration)
        #[arg(short, long)]
        port: Option<String>,

        /// Print events as JSON lines instead of sending MIDI
        #[arg(long)]
        dry_run: bool,
    },

    /// List MIDI output ports
    Ports,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "musicbox.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
