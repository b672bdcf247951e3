use thiserror::Error;

use crate::{codec::DecodeError, store::error::StoreError};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("corrupt record: {0}")]
    Decode(DecodeError),
    #[error("store unavailable: {0}")]
    StoreUnavailable(StoreError),
}

impl From<DecodeError> for QueryError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<StoreError> for QueryError {
    fn from(value: StoreError) -> Self {
        Self::StoreUnavailable(value)
    }
}
