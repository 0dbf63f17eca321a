use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppError;
use crate::geocoding::resolver::AddressResolver;
use crate::location::auto::AutoLocator;
use crate::models::coordinate::Coordinate;
use crate::models::tracking::{AgentLocationEvent, TrackingSnapshot};
use crate::observability::metrics::Metrics;
use crate::tracking::LiveTrackingSession;
use crate::tracking::map::MapConfig;

pub struct AppState {
    pub resolver: AddressResolver,
    pub locator: AutoLocator,
    pub map: MapConfig,
    pub sessions: DashMap<Uuid, LiveTrackingSession>,
    pub agent_events_tx: broadcast::Sender<AgentLocationEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        resolver: AddressResolver,
        locator: AutoLocator,
        map: MapConfig,
        event_buffer_size: usize,
    ) -> Self {
        let (agent_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            resolver,
            locator,
            map,
            sessions: DashMap::new(),
            agent_events_tx,
            metrics: Metrics::new(),
        }
    }

    /// Opens a session whose agent updates are published on the event
    /// channel.
    pub fn open_session(
        &self,
        delivery_id: Uuid,
        pickup: Option<Coordinate>,
        destination: Option<Coordinate>,
    ) -> Result<TrackingSnapshot, AppError> {
        let Entry::Vacant(slot) = self.sessions.entry(delivery_id) else {
            return Err(AppError::Conflict(format!(
                "tracking for delivery {delivery_id} already open"
            )));
        };

        let mut session = LiveTrackingSession::new(pickup, destination);
        let events = self.agent_events_tx.clone();
        session.set_observer(move |location| {
            let _ = events.send(AgentLocationEvent {
                delivery_id,
                location,
                recorded_at: Utc::now(),
            });
        });

        let snapshot = session.snapshot();
        slot.insert(session);
        self.metrics.active_tracking_sessions.inc();
        Ok(snapshot)
    }

    pub fn close_session(&self, delivery_id: Uuid) -> Result<(), AppError> {
        self.sessions
            .remove(&delivery_id)
            .ok_or_else(|| AppError::NotFound(format!("delivery {delivery_id} not tracked")))?;
        self.metrics.active_tracking_sessions.dec();
        Ok(())
    }
}
