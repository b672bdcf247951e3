use std::{collections::BTreeSet, num::NonZeroUsize, path::Path};

use aggregator::{ChronologicalSamples, RawSample, aggregate};
use error::{DataError, IngestError};
use tracing::info;

use crate::store::ScoreStore;

pub mod aggregator;
pub mod error;
pub mod reader;

/// How the order of input rows is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputOrder {
    /// sort by arrival time before batching
    #[default]
    Sort,
    /// rows must already be chronological, anything else aborts the run
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub rows: usize,
    pub records: usize,
    pub devices: usize,
}

/// Bulk-loads a CSV export into the store.
pub async fn run<S: ScoreStore>(
    store: &S,
    path: &Path,
    batch_size: NonZeroUsize,
    order: InputOrder,
) -> Result<IngestReport, IngestError> {
    info!(path = %path.display(), ?order, "reading samples");
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DataError::Csv(e.into()))?;
    let samples = reader::read_samples(bytes.as_slice())?;
    ingest_samples(store, samples, batch_size, order).await
}

/// Sorts, batches and stores already parsed samples. Nothing is written
/// unless every sample made it through.
pub async fn ingest_samples<S: ScoreStore>(
    store: &S,
    samples: Vec<RawSample>,
    batch_size: NonZeroUsize,
    order: InputOrder,
) -> Result<IngestReport, IngestError> {
    let samples = match order {
        InputOrder::Sort => ChronologicalSamples::sort(samples),
        InputOrder::Strict => ChronologicalSamples::try_from_sorted(samples)?,
    };
    if samples.is_empty() {
        info!("no samples to ingest");
        return Ok(IngestReport::default());
    }

    let records = aggregate(&samples, batch_size);
    let devices: BTreeSet<String> = records.iter().map(|(d, _)| d.clone()).collect();
    let report = IngestReport {
        rows: samples.len(),
        records: records.len(),
        devices: devices.len(),
    };

    store.add_all(records).await?;

    for device_id in &devices {
        let stored = store.cardinality(device_id).await?;
        info!(device_id, stored, "device updated");
    }
    info!(?report, "ingest done");

    Ok(report)
}
