use std::{collections::BTreeMap, num::NonZeroUsize};

use tracing::{Level, debug, info, span};

use super::error::DataError;
use crate::codec::{self, EncodedRecord, round4};

/// One raw telemetry sample. Times are epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    /// when the device measured it
    pub sample_time: f64,
    /// when it reached us, used as the store score
    pub arrival_time: f64,
}

/// Samples in ascending arrival-time order. Batching is only meaningful over
/// chronological input, so the aggregator takes nothing else.
#[derive(Debug, Clone, Default)]
pub struct ChronologicalSamples(Vec<RawSample>);

impl ChronologicalSamples {
    /// Stable sort by arrival time.
    pub fn sort(mut samples: Vec<RawSample>) -> Self {
        samples.sort_by(|a, b| a.arrival_time.total_cmp(&b.arrival_time));
        Self(samples)
    }

    /// Accepts input that is already sorted, failing on the first sample that
    /// goes back in time.
    pub fn try_from_sorted(samples: Vec<RawSample>) -> Result<Self, DataError> {
        for (idx, pair) in samples.windows(2).enumerate() {
            if pair[1].arrival_time < pair[0].arrival_time {
                return Err(DataError::OutOfOrder {
                    index: idx + 1,
                    arrival_time: pair[1].arrival_time,
                });
            }
        }
        Ok(Self(samples))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawSample> {
        self.0.iter()
    }
}

#[derive(Debug, Default)]
struct BatchAccumulator {
    lat_sum: f64,
    lon_sum: f64,
    speed_sum: f64,
    count: usize,
    /// times of the last sample pushed, used as the batch's time anchor
    sample_time: f64,
    arrival_time: f64,
}

impl BatchAccumulator {
    fn push(&mut self, sample: &RawSample) {
        self.lat_sum += sample.latitude;
        self.lon_sum += sample.longitude;
        self.speed_sum += sample.speed;
        self.count += 1;
        self.sample_time = sample.sample_time;
        self.arrival_time = sample.arrival_time;
    }

    /// Encodes the mean of the batch and resets the sums.
    fn flush(&mut self, divisor: usize) -> EncodedRecord {
        let n = divisor as f64;
        let rec = codec::encode(
            round4(self.lat_sum / n),
            round4(self.lon_sum / n),
            self.sample_time,
            round4(self.speed_sum / n),
            self.arrival_time,
        );
        *self = Self::default();
        rec
    }
}

/// Reduces every `batch_size` consecutive samples of a device to one averaged
/// record, then flushes whatever is left per device. Trailing flushes come
/// out in device-id order.
pub fn aggregate(
    samples: &ChronologicalSamples,
    batch_size: NonZeroUsize,
) -> Vec<(String, EncodedRecord)> {
    let span = span!(Level::INFO, "Aggregator", batch_size = batch_size.get());
    let _enter = span.enter();

    let mut batches: BTreeMap<&str, BatchAccumulator> = BTreeMap::new();
    let mut out = Vec::with_capacity(samples.len() / batch_size.get() + 1);

    for sample in samples.iter() {
        let acc = batches.entry(sample.device_id.as_str()).or_default();
        acc.push(sample);
        if acc.count == batch_size.get() {
            out.push((sample.device_id.clone(), acc.flush(batch_size.get())));
        }
    }

    let full = out.len();
    for (device_id, acc) in batches.iter_mut() {
        if acc.count > 0 {
            debug!(device_id = *device_id, count = acc.count, "flushing partial batch");
            let count = acc.count;
            out.push((device_id.to_string(), acc.flush(count)));
        }
    }

    info!(
        samples = samples.len(),
        devices = batches.len(),
        full,
        partial = out.len() - full,
        "aggregated"
    );
    out
}
