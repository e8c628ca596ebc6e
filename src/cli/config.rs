// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};

/// opusmux - Ogg/Opus stream tool
#[derive(Parser, Debug)]
#[command(name = "opusmux")]
#[command(about = "Inspect, verify and re-stamp Ogg/Opus streams", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// Compact JSON
    Json,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show stream information for Ogg/Opus file(s)
    Info {
        /// Input file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// List every page of an Ogg/Opus file
    Pages {
        /// Input file path
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Verify page checksums
    Verify {
        /// Input file path(s)
        #[arg(value_name = "FILE")]
        files: Vec<String>,

        /// Verify every matching file under a directory instead
        #[arg(short, long)]
        directory: Option<String>,

        /// File pattern for directory mode (e.g. "*.opus")
        #[arg(short, long, default_value = "*.opus")]
        pattern: String,
    },

    /// Re-stamp an externally produced page sequence into a playable stream
    Remux {
        /// Input file holding the raw encoder output pages
        #[arg(value_name = "INPUT")]
        input: String,

        /// Output file
        #[arg(value_name = "OUTPUT")]
        output: String,

        /// Input sample rate written into the identification header
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,

        /// Channel count
        #[arg(long, default_value_t = 1)]
        channels: u8,

        /// Pre-skip in 48 kHz samples
        #[arg(long, default_value_t = opusmux::opus::DEFAULT_PRE_SKIP)]
        pre_skip: u16,
    },
}
