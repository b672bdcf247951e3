use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::query::error::QueryError;

#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub status: u16,
    pub info: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    info: String,
}

impl ApiError {
    /// `not_found` is the status reported when the query came back empty,
    /// which differs between the lookup and the range endpoints.
    pub fn from_query(err: QueryError, not_found: StatusCode) -> Self {
        let status = match &err {
            QueryError::Validation(_) => StatusCode::BAD_REQUEST,
            QueryError::NotFound(_) => not_found,
            QueryError::Decode(e) => {
                warn!("serving corrupt record as 500: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            QueryError::StoreUnavailable(e) => {
                error!("store unavailable: {e}");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        Self {
            status,
            info: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            info: value.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: self.status.as_u16(),
            info: self.info,
        };
        (self.status, Json(body)).into_response()
    }
}
