use error::QueryError;
use page::{PagePolicy, PageRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    codec::{self, DecodedPoint},
    store::{ScoreStore, ScoredMember},
    time::parse_query_instant,
};

pub mod error;
pub mod page;

pub const UNKNOWN_DEVICE: &str = "invalid device id. cross check the correct device id.";
pub const EMPTY_RANGE: &str = "invalid device id or start and end timestamp out of range or no records in given page number.";
const BAD_TIME_WINDOW: &str = "invalid start time or end time. must be a valid iso timestamp str";

const FIRST: (i64, i64) = (0, 0);
const LAST: (i64, i64) = (-1, -1);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub device_id: String,
    pub start_location: Coordinates,
    pub end_location: Coordinates,
}

/// Read side of the service. Stateless apart from the store handle, so one
/// engine is shared by every request.
pub struct QueryEngine<S> {
    store: S,
    policy: PagePolicy,
}

impl<S: ScoreStore> QueryEngine<S> {
    pub fn new(store: S, policy: PagePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Most recent point for the device.
    pub async fn latest(&self, device_id: &str) -> Result<DecodedPoint, QueryError> {
        self.edge(device_id, LAST).await
    }

    /// First and last known location of the device.
    pub async fn boundary(&self, device_id: &str) -> Result<LocationSummary, QueryError> {
        let start = self.edge(device_id, FIRST).await?;
        let end = self.edge(device_id, LAST).await?;

        Ok(LocationSummary {
            device_id: device_id.to_string(),
            start_location: Coordinates {
                latitude: start.latitude,
                longitude: start.longitude,
            },
            end_location: Coordinates {
                latitude: end.latitude,
                longitude: end.longitude,
            },
        })
    }

    /// One page of points whose arrival time lies in `[start, end]`.
    pub async fn range(
        &self,
        device_id: &str,
        start_iso: &str,
        end_iso: &str,
        page: PageRequest,
    ) -> Result<Vec<DecodedPoint>, QueryError> {
        let (Some(start), Some(end)) = (parse_query_instant(start_iso), parse_query_instant(end_iso))
        else {
            return Err(QueryError::Validation(BAD_TIME_WINDOW.to_string()));
        };
        let window = self.policy.window(page)?;
        debug!(device_id, start, end, ?window, "range query");

        let res = self
            .store
            .range_by_score(device_id, start, end, window.offset, window.limit)
            .await?;
        if res.is_empty() {
            return Err(QueryError::NotFound(EMPTY_RANGE));
        }

        res.iter().map(|e| decode(device_id, e)).collect()
    }

    async fn edge(&self, device_id: &str, (start, stop): (i64, i64)) -> Result<DecodedPoint, QueryError> {
        let res = self.store.range_by_rank(device_id, start, stop).await?;
        match res.first() {
            Some(entry) => decode(device_id, entry),
            None => Err(QueryError::NotFound(UNKNOWN_DEVICE)),
        }
    }
}

fn decode(device_id: &str, entry: &ScoredMember) -> Result<DecodedPoint, QueryError> {
    codec::decode(device_id, &entry.member, entry.score).map_err(|e| {
        warn!(device_id, "stored record is corrupt: {e}");
        QueryError::Decode(e)
    })
}
