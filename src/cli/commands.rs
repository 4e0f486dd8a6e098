//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Datadis connector CLI
#[derive(Parser, Debug)]
#[command(name = "datadis-cdk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and report whether the credentials work
    Check,

    /// Read the supply points of the account
    Supplies {
        /// Maximum records to print
        #[arg(long)]
        max_records: Option<usize>,
    },

    /// Read consumption data for every supply point
    Consumption {
        /// First month of the window (YYYY/MM)
        #[arg(long)]
        start_date: Option<String>,

        /// Last month of the window (YYYY/MM), defaults to the start date
        #[arg(long)]
        end_date: Option<String>,

        /// Maximum records to print
        #[arg(long)]
        max_records: Option<usize>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
