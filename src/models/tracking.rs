use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub agent: Option<Coordinate>,
    pub pickup: Option<Coordinate>,
    pub destination: Option<Coordinate>,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<i64>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentLocationEvent {
    pub delivery_id: Uuid,
    pub location: Coordinate,
    pub recorded_at: DateTime<Utc>,
}
