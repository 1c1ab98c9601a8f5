use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(
    name = "segpreview",
    version,
    about = "Preview-based interactive segmentation sessions"
)]
pub(super) struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub(super) verbose: bool,

    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Runs a session file and prints its report.
    Run {
        #[arg(long)]
        session: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validates a session file without running it.
    Check {
        #[arg(long)]
        session: PathBuf,
    },
    Algorithms {
        #[command(subcommand)]
        command: AlgorithmsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub(super) enum AlgorithmsCommand {
    List,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionCheck {
    pub(super) status: &'static str,
    pub(super) name: Option<String>,
    pub(super) algorithm: String,
    pub(super) shape: Vec<usize>,
    pub(super) time_steps: usize,
    pub(super) steps: Vec<&'static str>,
}
