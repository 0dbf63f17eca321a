use std::sync::Arc;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::geocoding::resolver::AddressResolver;
use crate::location::cache::LocationCache;
use crate::location::{PositionError, PositionOptions, PositionSource};
use crate::models::address::DetectedLocation;

/// Detects the current location once per cache window: position source,
/// then reverse resolution, then cache.
#[derive(Clone)]
pub struct AutoLocator {
    source: Arc<dyn PositionSource>,
    resolver: AddressResolver,
    cache: LocationCache,
    options: PositionOptions,
}

impl AutoLocator {
    pub fn new(
        source: Arc<dyn PositionSource>,
        resolver: AddressResolver,
        cache: LocationCache,
    ) -> Self {
        Self {
            source,
            resolver,
            cache,
            options: PositionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    /// Serves a fresh cache entry unless `force` is set. A failed reverse
    /// lookup still yields the bare coordinate.
    pub async fn detect(&self, force: bool) -> Result<DetectedLocation, PositionError> {
        if !force {
            if let Some(entry) = self.cache.load(Utc::now()) {
                return Ok(entry.data);
            }
        }

        let coordinate = timeout(
            self.options.timeout,
            self.source.current_position(&self.options),
        )
        .await
        .unwrap_or(Err(PositionError::Timeout))
        .inspect_err(|err| match err {
            PositionError::PermissionDenied => info!("location permission denied"),
            other => warn!(error = %other, "location detection failed"),
        })?;

        let components = self
            .resolver
            .resolve_backward(coordinate.latitude(), coordinate.longitude())
            .await
            .unwrap_or_default();

        let detected = DetectedLocation {
            components,
            coordinate,
        };
        self.cache.store(&detected, Utc::now());

        info!(%coordinate, city = ?detected.components.city, "location detected");
        Ok(detected)
    }
}
