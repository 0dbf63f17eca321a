pub mod map;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::geo;
use crate::models::coordinate::Coordinate;
use crate::models::tracking::TrackingSnapshot;

pub type AgentObserver = Box<dyn Fn(Coordinate) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackingState {
    AwaitingAgent,
    Tracking,
}

/// Per-delivery live tracking state. Updates are applied in arrival order;
/// once an agent position has been seen it is only ever replaced.
pub struct LiveTrackingSession {
    agent: Option<Coordinate>,
    pickup: Option<Coordinate>,
    destination: Option<Coordinate>,
    distance_km: Option<f64>,
    eta_minutes: Option<i64>,
    last_updated: DateTime<Utc>,
    observer: Option<AgentObserver>,
}

impl LiveTrackingSession {
    pub fn new(pickup: Option<Coordinate>, destination: Option<Coordinate>) -> Self {
        Self {
            agent: None,
            pickup,
            destination,
            distance_km: None,
            eta_minutes: None,
            last_updated: Utc::now(),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: impl Fn(Coordinate) + Send + Sync + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn state(&self) -> TrackingState {
        if self.agent.is_some() {
            TrackingState::Tracking
        } else {
            TrackingState::AwaitingAgent
        }
    }

    pub fn agent(&self) -> Option<Coordinate> {
        self.agent
    }

    pub fn pickup(&self) -> Option<Coordinate> {
        self.pickup
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    pub fn set_pickup(&mut self, pickup: Coordinate) {
        self.pickup = Some(pickup);
    }

    /// Late-arriving destination, e.g. after the address was geocoded.
    pub fn set_destination(&mut self, destination: Coordinate) {
        self.destination = Some(destination);
        self.recompute();
    }

    pub fn on_agent_location_update(&mut self, location: Coordinate) -> TrackingSnapshot {
        self.agent = Some(location);
        self.recompute();
        self.last_updated = Utc::now();

        debug!(
            %location,
            distance_km = ?self.distance_km,
            eta_minutes = ?self.eta_minutes,
            "agent location updated"
        );

        if let Some(observer) = &self.observer {
            observer(location);
        }

        self.snapshot()
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot {
            agent: self.agent,
            pickup: self.pickup,
            destination: self.destination,
            distance_km: self.distance_km,
            eta_minutes: self.eta_minutes,
            last_updated: self.last_updated,
        }
    }

    fn recompute(&mut self) {
        if let (Some(agent), Some(destination)) = (self.agent, self.destination) {
            let estimate = geo::estimate(&agent, &destination);
            self.distance_km = Some(estimate.distance_km);
            self.eta_minutes = Some(estimate.eta_minutes);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{LiveTrackingSession, TrackingState};
    use crate::models::coordinate::Coordinate;

    fn point(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn starts_awaiting_agent_without_estimates() {
        let session = LiveTrackingSession::new(Some(point(10.0, 10.0)), Some(point(10.5, 10.5)));

        assert_eq!(session.state(), TrackingState::AwaitingAgent);
        let snapshot = session.snapshot();
        assert!(snapshot.agent.is_none());
        assert!(snapshot.distance_km.is_none());
        assert!(snapshot.eta_minutes.is_none());
    }

    #[test]
    fn first_update_starts_tracking() {
        let mut session = LiveTrackingSession::new(None, Some(point(10.5, 10.5)));
        let snapshot = session.on_agent_location_update(point(10.0, 10.0));

        assert_eq!(session.state(), TrackingState::Tracking);
        assert_eq!(snapshot.agent, Some(point(10.0, 10.0)));
        assert!(snapshot.distance_km.unwrap() > 0.0);
        assert!(snapshot.eta_minutes.unwrap() > 0);
    }

    #[test]
    fn moving_towards_destination_shrinks_distance() {
        let mut session = LiveTrackingSession::new(None, Some(point(10.5, 10.5)));

        let first = session.on_agent_location_update(point(10.0, 10.0));
        let second = session.on_agent_location_update(point(10.01, 10.01));

        assert!(second.distance_km.unwrap() < first.distance_km.unwrap());
        assert!(second.last_updated >= first.last_updated);
    }

    #[test]
    fn no_destination_leaves_estimates_absent() {
        let mut session = LiveTrackingSession::new(Some(point(10.0, 10.0)), None);
        let snapshot = session.on_agent_location_update(point(10.1, 10.1));

        assert_eq!(session.state(), TrackingState::Tracking);
        assert!(snapshot.distance_km.is_none());
        assert!(snapshot.eta_minutes.is_none());
    }

    #[test]
    fn late_destination_triggers_estimate() {
        let mut session = LiveTrackingSession::new(None, None);
        session.on_agent_location_update(point(10.0, 10.0));
        assert!(session.snapshot().distance_km.is_none());

        session.set_destination(point(10.5, 10.5));
        assert!(session.snapshot().distance_km.is_some());
    }

    #[test]
    fn observer_sees_every_agent_update() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut session = LiveTrackingSession::new(None, None);
        session.set_observer(move |location| sink.lock().unwrap().push(location));

        session.on_agent_location_update(point(1.0, 1.0));
        session.on_agent_location_update(point(2.0, 2.0));

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            [point(1.0, 1.0), point(2.0, 2.0)]
        );
    }
}
