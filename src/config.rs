use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::geocoding::nominatim;
use crate::geocoding::normalize::Region;
use crate::geocoding::retry::RetryPolicy;
use crate::location::PositionOptions;
use crate::models::coordinate::Coordinate;
use crate::tracking::map::MapConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum PositionSourceKind {
    IpApi,
    Fixed(Option<Coordinate>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
    pub region: Region,
    pub retry: RetryPolicy,
    pub map: MapConfig,
    pub location_cache_path: PathBuf,
    pub position_source: PositionSourceKind,
    pub position_options: PositionOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let default_region = Region::default();
        let region = Region {
            country_code: env::var("GEOCODER_COUNTRY_CODE")
                .unwrap_or(default_region.country_code),
            country_name: env::var("GEOCODER_COUNTRY_NAME")
                .unwrap_or(default_region.country_name),
            native_names: default_region.native_names,
        };

        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or_default("GEOCODER_MAX_ATTEMPTS", default_retry.max_attempts)?
                .max(1),
            forward_timeout: secs_or_default(
                "GEOCODER_FORWARD_TIMEOUT_SECS",
                default_retry.forward_timeout,
            )?,
            reverse_timeout: secs_or_default(
                "GEOCODER_REVERSE_TIMEOUT_SECS",
                default_retry.reverse_timeout,
            )?,
            ..default_retry
        };

        let default_position = PositionOptions::default();
        let position_options = PositionOptions {
            high_accuracy: parse_or_default(
                "POSITION_HIGH_ACCURACY",
                default_position.high_accuracy,
            )?,
            timeout: secs_or_default("POSITION_TIMEOUT_SECS", default_position.timeout)?,
            maximum_age: secs_or_default("POSITION_MAX_AGE_SECS", default_position.maximum_age)?,
        };

        let map = MapConfig {
            api_key: env::var("MAPS_API_KEY").ok().filter(|key| !key.is_empty()),
            zoom: parse_or_default("MAP_ZOOM", MapConfig::default().zoom)?,
            ..MapConfig::default()
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| nominatim::DEFAULT_BASE_URL.to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or_else(|_| {
                format!("delivery-locator/{}", env!("CARGO_PKG_VERSION"))
            }),
            region,
            retry,
            map,
            location_cache_path: env::var("LOCATION_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("location-cache.json")),
            position_source: position_source_from_env()?,
            position_options,
        })
    }
}

fn position_source_from_env() -> Result<PositionSourceKind, AppError> {
    let kind = env::var("POSITION_SOURCE").unwrap_or_else(|_| "fixed".to_string());

    match kind.as_str() {
        "ip" => Ok(PositionSourceKind::IpApi),
        "fixed" => {
            let latitude = parse_optional::<f64>("FIXED_LATITUDE")?;
            let longitude = parse_optional::<f64>("FIXED_LONGITUDE")?;
            let position = match (latitude, longitude) {
                (Some(lat), Some(lon)) => Some(
                    Coordinate::new(lat, lon)
                        .map_err(|err| AppError::Internal(format!("invalid fixed position: {err}")))?,
                ),
                _ => None,
            };
            Ok(PositionSourceKind::Fixed(position))
        }
        other => Err(AppError::Internal(format!(
            "invalid POSITION_SOURCE: {other} (expected ip or fixed)"
        ))),
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(key)?.unwrap_or(default))
}

fn secs_or_default(key: &str, default: Duration) -> Result<Duration, AppError> {
    Ok(parse_optional::<u64>(key)?
        .map(Duration::from_secs)
        .unwrap_or(default))
}

fn parse_optional<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(None),
    }
}
