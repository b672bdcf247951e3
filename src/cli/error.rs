use thiserror::Error;

use crate::{
    config::ConfigError, ingest::error::IngestError, query::error::QueryError,
    store::error::StoreError,
};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("config error `{0}`")]
    ConfigError(ConfigError),
    #[error("store error `{0}`")]
    StoreError(StoreError),
    #[error("query error `{0}`")]
    QueryError(QueryError),
    #[error("ingest error `{0}`")]
    IngestError(IngestError),
    #[error("io error `{0}`")]
    IoError(std::io::Error),
    #[error("json encoding error `{0}`")]
    JsonEncodingError(String),
}

impl From<ConfigError> for DispatchError {
    fn from(value: ConfigError) -> Self {
        Self::ConfigError(value)
    }
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        Self::StoreError(value)
    }
}

impl From<QueryError> for DispatchError {
    fn from(value: QueryError) -> Self {
        Self::QueryError(value)
    }
}

impl From<IngestError> for DispatchError {
    fn from(value: IngestError) -> Self {
        Self::IngestError(value)
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(value: serde_json::Error) -> Self {
        Self::JsonEncodingError(value.to_string())
    }
}
