use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::models::coordinate::Coordinate;
use crate::tracking::LiveTrackingSession;

pub const STATIC_MAP_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";
pub const DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";
pub const SEARCH_URL: &str = "https://www.google.com/maps/search/";

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub api_key: Option<String>,
    pub zoom: u8,
    pub size: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            zoom: 13,
            size: "600x400".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    Static,
    Directions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKind {
    Pickup,
    Destination,
    Agent,
}

impl MarkerKind {
    fn color(self) -> &'static str {
        match self {
            MarkerKind::Pickup => "green",
            MarkerKind::Destination => "red",
            MarkerKind::Agent => "blue",
        }
    }

    fn label(self) -> &'static str {
        match self {
            MarkerKind::Pickup => "P",
            MarkerKind::Destination => "D",
            MarkerKind::Agent => "A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub color: &'static str,
    pub label: &'static str,
    pub position: Coordinate,
}

impl Marker {
    fn new(kind: MarkerKind, position: Coordinate) -> Self {
        Self {
            kind,
            color: kind.color(),
            label: kind.label(),
            position,
        }
    }

    fn as_param(&self) -> String {
        format!("color:{}|label:{}|{}", self.color, self.label, self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderParameters {
    pub markers: Vec<Marker>,
    pub center: Option<Coordinate>,
    pub path: Vec<Coordinate>,
}

impl LiveTrackingSession {
    pub fn render_parameters(&self) -> RenderParameters {
        let markers = [
            (MarkerKind::Pickup, self.pickup()),
            (MarkerKind::Destination, self.destination()),
            (MarkerKind::Agent, self.agent()),
        ]
        .into_iter()
        .filter_map(|(kind, position)| position.map(|p| Marker::new(kind, p)))
        .collect();

        let center = self.agent().or(self.pickup()).or(self.destination());

        let path = match (self.agent().or(self.pickup()), self.destination()) {
            (Some(from), Some(to)) => vec![from, to],
            _ => Vec::new(),
        };

        RenderParameters {
            markers,
            center,
            path,
        }
    }

    /// `None` only when the session knows no coordinate at all.
    pub fn map_provider_url(&self, kind: MapKind, config: &MapConfig) -> Option<String> {
        let render = self.render_parameters();
        let center = render.center?;

        let url = match (kind, self.agent(), self.destination()) {
            (MapKind::Static, _, _) => static_map_url(&render, center, config),
            (MapKind::Directions, Some(origin), Some(destination)) => {
                directions_url(origin, destination, config)
            }
            (MapKind::Directions, _, _) => single_point_url(center, config),
        };

        url.map(String::from)
    }
}

fn static_map_url(
    render: &RenderParameters,
    center: Coordinate,
    config: &MapConfig,
) -> Option<Url> {
    let mut url = Url::parse(STATIC_MAP_URL).ok()?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("center", &center.to_string())
            .append_pair("zoom", &config.zoom.to_string())
            .append_pair("size", &config.size);

        for marker in &render.markers {
            query.append_pair("markers", &marker.as_param());
        }

        if !render.path.is_empty() {
            let points: Vec<String> = render.path.iter().map(ToString::to_string).collect();
            query.append_pair("path", &format!("color:0x0000ff|weight:4|{}", points.join("|")));
        }

        if let Some(key) = &config.api_key {
            query.append_pair("key", key);
        }
    }
    Some(url)
}

fn directions_url(
    origin: Coordinate,
    destination: Coordinate,
    config: &MapConfig,
) -> Option<Url> {
    let mut url = Url::parse(DIRECTIONS_URL).ok()?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("api", "1")
            .append_pair("origin", &origin.to_string())
            .append_pair("destination", &destination.to_string())
            .append_pair("travelmode", "driving");

        if let Some(key) = &config.api_key {
            query.append_pair("key", key);
        }
    }
    Some(url)
}

fn single_point_url(point: Coordinate, config: &MapConfig) -> Option<Url> {
    let mut url = Url::parse(SEARCH_URL).ok()?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("api", "1")
            .append_pair("query", &point.to_string());

        if let Some(key) = &config.api_key {
            query.append_pair("key", key);
        }
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use reqwest::Url;

    use super::{MapConfig, MapKind, MarkerKind};
    use crate::models::coordinate::Coordinate;
    use crate::tracking::LiveTrackingSession;

    fn point(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn params(url: &str, name: &str) -> Vec<String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }

    #[test]
    fn markers_only_for_known_points() {
        let session = LiveTrackingSession::new(Some(point(9.0, 77.0)), None);
        let render = session.render_parameters();

        assert_eq!(render.markers.len(), 1);
        assert_eq!(render.markers[0].kind, MarkerKind::Pickup);
        assert_eq!(render.center, Some(point(9.0, 77.0)));
        assert!(render.path.is_empty());
    }

    #[test]
    fn center_prefers_agent_then_pickup_then_destination() {
        let mut session = LiveTrackingSession::new(None, Some(point(9.5, 77.5)));
        assert_eq!(session.render_parameters().center, Some(point(9.5, 77.5)));

        session.set_pickup(point(9.0, 77.0));
        assert_eq!(session.render_parameters().center, Some(point(9.0, 77.0)));

        session.on_agent_location_update(point(9.2, 77.2));
        let render = session.render_parameters();
        assert_eq!(render.center, Some(point(9.2, 77.2)));
        assert_eq!(render.markers.len(), 3);
        assert_eq!(render.path, vec![point(9.2, 77.2), point(9.5, 77.5)]);
    }

    #[test]
    fn empty_session_has_no_center_or_url() {
        let session = LiveTrackingSession::new(None, None);
        assert!(session.render_parameters().center.is_none());
        assert!(
            session
                .map_provider_url(MapKind::Static, &MapConfig::default())
                .is_none()
        );
    }

    #[test]
    fn static_url_lists_markers_path_and_key() {
        let mut session = LiveTrackingSession::new(Some(point(9.0, 77.0)), Some(point(9.5, 77.5)));
        session.on_agent_location_update(point(9.2, 77.2));
        let config = MapConfig {
            api_key: Some("secret".to_string()),
            ..MapConfig::default()
        };

        let url = session.map_provider_url(MapKind::Static, &config).unwrap();

        assert!(url.starts_with(super::STATIC_MAP_URL));
        assert_eq!(params(&url, "center"), ["9.2,77.2"]);
        assert_eq!(params(&url, "zoom"), ["13"]);
        assert_eq!(
            params(&url, "markers"),
            [
                "color:green|label:P|9,77",
                "color:red|label:D|9.5,77.5",
                "color:blue|label:A|9.2,77.2",
            ]
        );
        assert_eq!(params(&url, "path"), ["color:0x0000ff|weight:4|9.2,77.2|9.5,77.5"]);
        assert_eq!(params(&url, "key"), ["secret"]);
    }

    #[test]
    fn missing_key_still_builds_url() {
        let session = LiveTrackingSession::new(Some(point(9.0, 77.0)), None);
        let url = session
            .map_provider_url(MapKind::Static, &MapConfig::default())
            .unwrap();

        assert!(params(&url, "key").is_empty());
        assert_eq!(params(&url, "center"), ["9,77"]);
    }

    #[test]
    fn directions_need_agent_and_destination() {
        let mut session = LiveTrackingSession::new(Some(point(9.0, 77.0)), Some(point(9.5, 77.5)));

        let fallback = session
            .map_provider_url(MapKind::Directions, &MapConfig::default())
            .unwrap();
        assert!(fallback.starts_with(super::SEARCH_URL));
        assert_eq!(params(&fallback, "query"), ["9,77"]);

        session.on_agent_location_update(point(9.2, 77.2));
        let directions = session
            .map_provider_url(MapKind::Directions, &MapConfig::default())
            .unwrap();
        assert!(directions.starts_with(super::DIRECTIONS_URL));
        assert_eq!(params(&directions, "origin"), ["9.2,77.2"]);
        assert_eq!(params(&directions, "destination"), ["9.5,77.5"]);
        assert_eq!(params(&directions, "travelmode"), ["driving"]);
    }
}
