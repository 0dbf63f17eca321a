use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, put};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::coordinate::Coordinate;
use crate::models::tracking::TrackingSnapshot;
use crate::state::AppState;
use crate::tracking::TrackingState;
use crate::tracking::map::{MapKind, RenderParameters};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/deliveries/:id/tracking",
            get(get_tracking)
                .post(open_tracking)
                .delete(close_tracking),
        )
        .route("/deliveries/:id/route", put(update_route))
        .route("/deliveries/:id/agent-location", patch(update_agent_location))
        .route("/deliveries/:id/render", get(render_parameters))
        .route("/deliveries/:id/map-url", get(map_url))
}

#[derive(Deserialize)]
pub struct RouteRequest {
    pub pickup: Option<Coordinate>,
    pub destination: Option<Coordinate>,
}

#[derive(Deserialize)]
pub struct AgentLocationRequest {
    pub location: Coordinate,
}

#[derive(Serialize)]
pub struct TrackingResponse {
    pub state: TrackingState,
    #[serde(flatten)]
    pub snapshot: TrackingSnapshot,
}

#[derive(Deserialize)]
pub struct MapUrlQuery {
    pub kind: MapKind,
}

#[derive(Serialize)]
pub struct MapUrlResponse {
    pub url: Option<String>,
}

fn not_tracked(id: Uuid) -> AppError {
    AppError::NotFound(format!("delivery {id} not tracked"))
}

async fn open_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RouteRequest>,
) -> Result<(StatusCode, Json<TrackingResponse>), AppError> {
    let snapshot = state.open_session(id, payload.pickup, payload.destination)?;
    info!(delivery_id = %id, "tracking session opened");

    Ok((
        StatusCode::CREATED,
        Json(TrackingResponse {
            state: TrackingState::AwaitingAgent,
            snapshot,
        }),
    ))
}

async fn get_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackingResponse>, AppError> {
    let session = state.sessions.get(&id).ok_or_else(|| not_tracked(id))?;

    Ok(Json(TrackingResponse {
        state: session.state(),
        snapshot: session.snapshot(),
    }))
}

async fn close_tracking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.close_session(id)?;
    info!(delivery_id = %id, "tracking session closed");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RouteRequest>,
) -> Result<Json<TrackingResponse>, AppError> {
    let mut session = state.sessions.get_mut(&id).ok_or_else(|| not_tracked(id))?;

    if let Some(pickup) = payload.pickup {
        session.set_pickup(pickup);
    }
    if let Some(destination) = payload.destination {
        session.set_destination(destination);
    }

    Ok(Json(TrackingResponse {
        state: session.state(),
        snapshot: session.snapshot(),
    }))
}

async fn update_agent_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AgentLocationRequest>,
) -> Result<Json<TrackingResponse>, AppError> {
    let mut session = state.sessions.get_mut(&id).ok_or_else(|| not_tracked(id))?;

    let snapshot = session.on_agent_location_update(payload.location);
    state.metrics.tracking_updates_total.inc();

    Ok(Json(TrackingResponse {
        state: session.state(),
        snapshot,
    }))
}

async fn render_parameters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderParameters>, AppError> {
    let session = state.sessions.get(&id).ok_or_else(|| not_tracked(id))?;
    Ok(Json(session.render_parameters()))
}

async fn map_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<MapUrlQuery>,
) -> Result<Json<MapUrlResponse>, AppError> {
    let session = state.sessions.get(&id).ok_or_else(|| not_tracked(id))?;

    Ok(Json(MapUrlResponse {
        url: session.map_provider_url(query.kind, &state.map),
    }))
}
