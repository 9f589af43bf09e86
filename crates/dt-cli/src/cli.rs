//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Per-document active time tracker.
///
/// Accumulates the time each document spends focused while you are active,
/// and reports totals per document and per folder.
#[derive(Debug, Parser)]
#[command(name = "dt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track time from host events read as JSON lines on stdin.
    Watch,

    /// Show totals as a tree, for one path or everything.
    Report {
        /// Document or folder path (defaults to all top-level nodes).
        path: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the total time under one document or folder.
    Total {
        /// Document or folder path.
        path: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show time per ancestor folder of a document.
    Breadcrumb {
        /// Document path.
        path: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show ledger location and totals.
    Status,

    /// Forget the time recorded for a document.
    Reset {
        /// Document path.
        path: String,
    },
}
