use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::{Deserialize, Serialize};

use crate::models::address::DetectedLocation;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/location/current", get(current_location))
}

#[derive(Deserialize)]
pub struct DetectQuery {
    #[serde(default)]
    pub force: bool,
}

/// `location` and `message` are both absent when the user declined to
/// share a position.
#[derive(Serialize)]
pub struct DetectResponse {
    pub location: Option<DetectedLocation>,
    pub message: Option<&'static str>,
}

async fn current_location(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetectQuery>,
) -> Json<DetectResponse> {
    let response = match state.locator.detect(query.force).await {
        Ok(location) => DetectResponse {
            location: Some(location),
            message: None,
        },
        Err(err) => DetectResponse {
            location: None,
            message: err.user_message(),
        },
    };

    Json(response)
}
