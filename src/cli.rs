use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelforge")]
#[command(author, version, about = "Scheduled content-to-video pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler loop until interrupted
    Start,

    /// Run one admission check and, if allowed, one pipeline run
    Once {
        /// Skip admission checks and run immediately
        #[arg(long)]
        force: bool,
    },

    /// Create several videos back to back, ignoring the schedule
    Batch {
        /// Number of videos to create
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
    },

    /// Show run statistics and the current admission decision
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Show the trailing seven-day summary instead
        #[arg(long)]
        weekly: bool,
    },

    /// Print the effective configuration
    Config,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
