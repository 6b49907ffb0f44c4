use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "horsehub")]
#[command(author, version, about = "Keeps a published media directory in sync with a raw intake directory")]
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
    /// Convert new or changed intake files, delete stale outputs, and update
    /// the metadata document
    Sync {
        /// Intake directory (overrides config)
        #[arg(long)]
        intake: Option<PathBuf>,

        /// Output directory (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Metadata document (overrides config)
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Maximum number of conversions in flight (overrides config)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Show what would be done without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the metadata editor and accept metadata uploads
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory to serve static files from
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Metadata document (overrides config)
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}
