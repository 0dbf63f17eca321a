use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::location::{PositionError, PositionOptions, PositionSource};
use crate::models::coordinate::Coordinate;

pub const DEFAULT_ENDPOINT: &str = "http://ip-api.com/json/";

#[derive(Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Approximate position of this host via IP geolocation.
pub struct IpApiPositionSource {
    client: Client,
    endpoint: String,
    last_fix: Mutex<Option<(Instant, Coordinate)>>,
}

impl IpApiPositionSource {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            last_fix: Mutex::new(None),
        }
    }

    fn recent_fix(&self, options: &PositionOptions) -> Option<Coordinate> {
        let guard = self.last_fix.lock().ok()?;
        let (taken_at, coordinate) = (*guard)?;
        (taken_at.elapsed() <= options.maximum_age).then_some(coordinate)
    }

    fn remember(&self, coordinate: Coordinate) {
        if let Ok(mut guard) = self.last_fix.lock() {
            *guard = Some((Instant::now(), coordinate));
        }
    }
}

#[async_trait]
impl PositionSource for IpApiPositionSource {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinate, PositionError> {
        if let Some(coordinate) = self.recent_fix(options) {
            return Ok(coordinate);
        }

        if options.high_accuracy {
            debug!("high accuracy requested; ip geolocation is city-level at best");
        }

        let response = self
            .client
            .get(&self.endpoint)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    PositionError::Timeout
                } else {
                    PositionError::Unavailable(err.to_string())
                }
            })?
            .json::<IpApiResponse>()
            .await
            .map_err(|err| PositionError::Unavailable(err.to_string()))?;

        let coordinate = parse_response(response)?;
        info!(%coordinate, "ip geolocation successful");
        self.remember(coordinate);
        Ok(coordinate)
    }
}

fn parse_response(response: IpApiResponse) -> Result<Coordinate, PositionError> {
    if response.status != "success" {
        let reason = response
            .message
            .unwrap_or_else(|| "lookup failed".to_string());
        warn!(reason = %reason, "ip geolocation failed");
        return Err(PositionError::Unavailable(reason));
    }

    match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
            .map_err(|err| PositionError::Unavailable(err.to_string())),
        _ => Err(PositionError::Unavailable(
            "response carried no coordinates".to_string(),
        )),
    }
}
