use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::{
    api,
    config::CarnotConfig,
    ingest::{self, InputOrder, IngestReport},
    query::{LocationSummary, QueryEngine},
    store::{MemoryStore, ScoreStore, SqliteStore},
};

use super::{
    error::DispatchError,
    model::{Cli, CliCommands},
};

#[derive(Serialize)]
struct IngestResponse {
    rows: usize,
    records: usize,
    devices: usize,
}

#[derive(Serialize)]
struct StatsResponse {
    device_id: String,
    records: usize,
    boundary: Option<LocationSummary>,
}

impl From<IngestReport> for IngestResponse {
    fn from(r: IngestReport) -> Self {
        Self {
            rows: r.rows,
            records: r.records,
            devices: r.devices,
        }
    }
}

impl Cli {
    /// Opens the chosen store, runs the command against it and closes it
    /// again. Returns JSON output for commands that produce any.
    pub async fn dispatch(self, cfg: &CarnotConfig) -> Result<Option<String>, DispatchError> {
        if self.memory {
            info!("using in-memory store");
            return self.command.run(MemoryStore::new(), cfg).await;
        }

        let store = SqliteStore::open(&cfg.store).await?;
        let res = self.command.run(store.clone(), cfg).await;
        store.close().await?;
        res
    }
}

impl CliCommands {
    pub async fn run<S: ScoreStore + 'static>(
        self,
        store: S,
        cfg: &CarnotConfig,
    ) -> Result<Option<String>, DispatchError> {
        Ok(match self {
            CliCommands::Serve => {
                let engine = Arc::new(QueryEngine::new(store, cfg.query.clone()));
                api::serve(engine, &cfg.server.bind).await?;
                None
            }
            CliCommands::Ingest(args) => {
                let batch_size = match args.batch_size {
                    Some(n) => n,
                    None => cfg.ingest.batch_size()?,
                };
                let order = match args.require_sorted {
                    true => InputOrder::Strict,
                    false => InputOrder::Sort,
                };
                let report = ingest::run(&store, &args.file, batch_size, order).await?;
                Some(serde_json::to_string(&IngestResponse::from(report))?)
            }
            CliCommands::Stats(args) => {
                let engine = QueryEngine::new(store, cfg.query.clone());
                let records = engine.store().cardinality(&args.device_id).await?;
                let boundary = match records {
                    0 => None,
                    _ => Some(engine.boundary(&args.device_id).await?),
                };
                let res = StatsResponse {
                    device_id: args.device_id,
                    records,
                    boundary,
                };
                Some(serde_json::to_string_pretty(&res)?)
            }
        })
    }
}
