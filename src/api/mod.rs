use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use error::ApiError;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::{
    codec::DecodedPoint,
    query::{LocationSummary, QueryEngine, page::PageRequest},
    store::ScoreStore,
};

pub mod error;

type Engine<S> = State<Arc<QueryEngine<S>>>;
/// Malformed or missing parameters are answered with the JSON error payload
/// instead of axum's plain text rejection.
type Params<T> = Result<Query<T>, QueryRejection>;

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub device_id: String,
    pub iso_start_time: String,
    pub iso_end_time: String,
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub page_number: i64,
}

#[derive(Debug, Serialize)]
pub struct DeviceData {
    pub device_data: Vec<DecodedPoint>,
}

pub fn router<S: ScoreStore + 'static>(engine: Arc<QueryEngine<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/latest-device-info/", get(latest_device_info::<S>))
        .route("/location-coordinates/", get(location_coordinates::<S>))
        .route("/location-points/", get(location_points::<S>))
        .layer(cors)
        .with_state(engine)
}

/// Serves until Ctrl-C.
pub async fn serve<S: ScoreStore + 'static>(
    engine: Arc<QueryEngine<S>>,
    bind: &str,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(bind).await?;
    info!(bind, "listening");

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("could not listen for ctrl-c: {e}");
        return;
    }
    info!("shutting down");
}

async fn latest_device_info<S: ScoreStore>(
    State(engine): Engine<S>,
    params: Params<DeviceQuery>,
) -> Result<Json<DecodedPoint>, ApiError> {
    let Query(q) = params?;
    engine
        .latest(&q.device_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_query(e, StatusCode::BAD_REQUEST))
}

async fn location_coordinates<S: ScoreStore>(
    State(engine): Engine<S>,
    params: Params<DeviceQuery>,
) -> Result<Json<LocationSummary>, ApiError> {
    let Query(q) = params?;
    engine
        .boundary(&q.device_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_query(e, StatusCode::BAD_REQUEST))
}

async fn location_points<S: ScoreStore>(
    State(engine): Engine<S>,
    params: Params<RangeQuery>,
) -> Result<Json<DeviceData>, ApiError> {
    let Query(q) = params?;
    let page = PageRequest {
        page_size: q.page_size,
        page_number: q.page_number,
    };
    engine
        .range(&q.device_id, &q.iso_start_time, &q.iso_end_time, page)
        .await
        .map(|device_data| Json(DeviceData { device_data }))
        .map_err(|e| ApiError::from_query(e, StatusCode::NOT_FOUND))
}
