//! CLI definitions for citelegend.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// citelegend CLI.
#[derive(Parser)]
#[command(name = "citelegend")]
#[command(about = "Live citation-to-source legend for NotebookLM")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.citelegend/config.toml if present)
    #[arg(short, long, global = true, env = "CITELEGEND_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Attach to the notebook tab and keep the legend current (default)
    Watch,

    /// Run one full rescan and print the legend
    Scan {
        /// Print per-citation details as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rescan and copy the legend to the clipboard
    Copy,

    /// Print the chat transcript with citations as [N]
    Transcript,

    /// Rewrite [[long form]] citations in text read from stdin
    Enhance,

    /// Manage custom source names
    Override {
        #[command(subcommand)]
        action: OverrideAction,
    },

    /// Answer JSON requests on stdin, one per line
    Serve,
}

#[derive(Subcommand)]
pub(crate) enum OverrideAction {
    /// Set the display name for a citation
    Set {
        /// Citation key, e.g. 3
        key: String,

        /// Name to show instead of the resolved source
        name: String,
    },

    /// Remove a custom name
    Clear {
        /// Citation key
        key: String,
    },

    /// List custom names
    List,
}
