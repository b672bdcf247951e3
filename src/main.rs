use std::error::Error;

use clap::Parser;
use tracing::{Level, info, span};
use tracing_subscriber::EnvFilter;

use crate::{cli::model::Cli, config::CarnotConfig};

pub mod api;
pub mod cli;
pub mod codec;
pub mod config;
pub mod ingest;
pub mod query;
pub mod store;
pub mod time;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = CarnotConfig::load(cli.config.as_deref())?;

    {
        let span = span!(Level::INFO, "Carnot");
        let _enter = span.enter();
        info!(bind = %cfg.server.bind, store = %cfg.store.path, "initializing");
    }

    if let Some(out) = cli.dispatch(&cfg).await? {
        println!("{out}");
    }

    Ok(())
}
