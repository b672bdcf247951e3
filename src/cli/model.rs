use std::{num::NonZeroUsize, path::PathBuf};

use clap_derive::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// RON config file, `carnot.ron` is used if present
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Keep data in memory instead of the sqlite store
    #[arg(long, global = true)]
    pub memory: bool,
    #[command(subcommand)]
    pub command: CliCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommands {
    /// Run the HTTP query service
    Serve,
    /// Load a CSV export into the store
    Ingest(IngestArgs),
    /// Show what the store holds for a device
    Stats(StatsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    pub file: PathBuf,
    /// Samples averaged into one record, overrides the config
    #[arg(long)]
    pub batch_size: Option<NonZeroUsize>,
    /// Reject input that is not already in arrival order instead of sorting it
    #[arg(long)]
    pub require_sorted: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    pub device_id: String,
}
