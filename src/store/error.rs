use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
    #[error("sqlite error `{0}`")]
    SQLiteError(tokio_rusqlite::Error),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(value: tokio_rusqlite::Error) -> Self {
        Self::SQLiteError(value)
    }
}
