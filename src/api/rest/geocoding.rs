use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, ResolveError};
use crate::geo::{self, Estimate};
use crate::models::address::AddressComponents;
use crate::models::coordinate::Coordinate;
use crate::state::AppState;

pub const MAX_BATCH_ADDRESSES: usize = 50;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/geocode", post(geocode))
        .route("/geocode/batch", post(geocode_batch))
        .route("/geocode/reverse", post(reverse_geocode))
        .route("/distance", post(distance))
}

#[derive(Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Serialize)]
pub struct GeocodeResponse {
    pub coordinate: Option<Coordinate>,
}

#[derive(Deserialize)]
pub struct BatchGeocodeRequest {
    pub addresses: Vec<String>,
}

#[derive(Serialize)]
pub struct BatchGeocodeResponse {
    pub results: HashMap<String, Option<Coordinate>>,
}

/// Raw numbers so that out-of-range input yields an empty result rather
/// than a rejected body.
#[derive(Deserialize)]
pub struct ReverseGeocodeRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct ReverseGeocodeResponse {
    pub address: Option<AddressComponents>,
}

#[derive(Deserialize)]
pub struct DistanceRequest {
    pub from: Coordinate,
    pub to: Coordinate,
}

async fn geocode(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GeocodeRequest>,
) -> Json<GeocodeResponse> {
    let start = Instant::now();
    let result = state.resolver.try_resolve_forward(&payload.address).await;
    state.metrics.record_resolution(
        "forward",
        outcome(&result),
        start.elapsed().as_secs_f64(),
    );

    let coordinate = result
        .inspect_err(|err| warn!(address = %payload.address, error = %err, "address resolution failed"))
        .ok();
    Json(GeocodeResponse { coordinate })
}

async fn geocode_batch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BatchGeocodeRequest>,
) -> Result<Json<BatchGeocodeResponse>, AppError> {
    if payload.addresses.len() > MAX_BATCH_ADDRESSES {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_BATCH_ADDRESSES} addresses per batch"
        )));
    }

    let start = Instant::now();
    let results = state
        .resolver
        .batch_resolve_forward(&payload.addresses)
        .await;
    let resolved = results.values().filter(|c| c.is_some()).count();
    state.metrics.record_resolution(
        "batch",
        if resolved == results.len() { "resolved" } else { "partial" },
        start.elapsed().as_secs_f64(),
    );

    Ok(Json(BatchGeocodeResponse { results }))
}

async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReverseGeocodeRequest>,
) -> Json<ReverseGeocodeResponse> {
    let start = Instant::now();
    let result = state
        .resolver
        .try_resolve_backward(payload.latitude, payload.longitude)
        .await;
    state.metrics.record_resolution(
        "reverse",
        outcome(&result),
        start.elapsed().as_secs_f64(),
    );

    let address = result
        .inspect_err(|err| {
            warn!(
                latitude = payload.latitude,
                longitude = payload.longitude,
                error = %err,
                "reverse resolution failed"
            )
        })
        .ok();
    Json(ReverseGeocodeResponse { address })
}

async fn distance(Json(payload): Json<DistanceRequest>) -> Json<Estimate> {
    Json(geo::estimate(&payload.from, &payload.to))
}

fn outcome<T>(result: &Result<T, ResolveError>) -> &'static str {
    match result {
        Ok(_) => "resolved",
        Err(err) => err.outcome_label(),
    }
}
