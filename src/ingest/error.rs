use thiserror::Error;

use crate::store::error::StoreError;

/// A bad input row. Any of these aborts the whole ingestion run.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("line {line}: missing `{field}`")]
    MissingField { line: u64, field: &'static str },
    #[error("line {line}: non-numeric {field} `{value}`")]
    BadNumber {
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: unparsable {field} `{value}`")]
    BadTimestamp {
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("sample {index}: arrival time {arrival_time} is earlier than the previous sample")]
    OutOfOrder { index: usize, arrival_time: f64 },
    #[error("csv error `{0}`")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("data error: {0}")]
    Data(DataError),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<DataError> for IngestError {
    fn from(value: DataError) -> Self {
        Self::Data(value)
    }
}

impl From<StoreError> for IngestError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
