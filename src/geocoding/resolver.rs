use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ResolveError};
use crate::geo;
use crate::geocoding::normalize::{Region, normalize_address};
use crate::geocoding::retry::RetryPolicy;
use crate::geocoding::{GeocodingProvider, PlaceAddress, ReversePlace, SearchQuery};
use crate::models::address::AddressComponents;
use crate::models::coordinate::Coordinate;

pub const BATCH_SIZE: usize = 3;
pub const BATCH_ITEM_DELAY: Duration = Duration::from_secs(1);

/// Turns free-text addresses into coordinates and back. Every public method
/// is total: failures are logged and surface as `None`.
#[derive(Clone)]
pub struct AddressResolver {
    provider: Arc<dyn GeocodingProvider>,
    region: Region,
    policy: RetryPolicy,
}

impl AddressResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>, region: Region) -> Self {
        Self {
            provider,
            region,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn resolve_forward(&self, address: &str) -> Option<Coordinate> {
        match self.try_resolve_forward(address).await {
            Ok(coordinate) => {
                info!(address, %coordinate, "address resolved");
                Some(coordinate)
            }
            Err(err) => {
                warn!(address, error = %err, "address resolution failed");
                None
            }
        }
    }

    pub async fn resolve_backward(&self, latitude: f64, longitude: f64) -> Option<AddressComponents> {
        match self.try_resolve_backward(latitude, longitude).await {
            Ok(components) => Some(components),
            Err(err) => {
                warn!(latitude, longitude, error = %err, "reverse resolution failed");
                None
            }
        }
    }

    pub fn distance(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        geo::distance_km(a, b)
    }

    /// Resolves every distinct address, at most `BATCH_SIZE` in flight.
    pub async fn batch_resolve_forward(
        &self,
        addresses: &[String],
    ) -> HashMap<String, Option<Coordinate>> {
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = addresses
            .iter()
            .filter(|address| seen.insert(address.as_str()))
            .collect();

        let mut results = HashMap::with_capacity(distinct.len());
        for batch in distinct.chunks(BATCH_SIZE) {
            let resolved = join_all(batch.iter().map(|address| async move {
                let coordinate = self.resolve_forward(address).await;
                sleep(BATCH_ITEM_DELAY).await;
                ((*address).clone(), coordinate)
            }))
            .await;

            results.extend(resolved);
        }

        debug!(
            requested = addresses.len(),
            distinct = results.len(),
            "batch resolution finished"
        );
        results
    }

    /// Forward resolution with the underlying failure reason preserved.
    pub async fn try_resolve_forward(&self, address: &str) -> Result<Coordinate, ResolveError> {
        let original = address.trim();
        if original.is_empty() {
            return Err(ResolveError::EmptyAddress);
        }

        let normalized = normalize_address(original, &self.region);
        if normalized.query.is_empty() {
            return Err(ResolveError::EmptyAddress);
        }

        let mut query = normalized.query;
        let mut unsuffixed = normalized.country_appended.then(|| original.to_string());
        let mut attempt = 1;

        loop {
            match self.search_once(&query).await {
                Ok(Some(coordinate)) => return Ok(coordinate),
                Ok(None) => match unsuffixed.take() {
                    Some(fallback) => {
                        debug!(query = %query, fallback = %fallback, "no match with country suffix, retrying original");
                        query = fallback;
                    }
                    None => return Err(ResolveError::NoResult),
                },
                Err(failure) => {
                    let delay = self.next_delay(&failure, attempt)?;
                    debug!(attempt, error = %failure, delay_ms = delay.as_millis() as u64, "retrying search");
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Reverse resolution with the underlying failure reason preserved.
    pub async fn try_resolve_backward(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AddressComponents, ResolveError> {
        let coordinate =
            Coordinate::new(latitude, longitude).map_err(|_| ResolveError::InvalidCoordinate)?;
        let mut attempt = 1;

        loop {
            let outcome = timeout(
                self.policy.reverse_timeout,
                self.provider
                    .reverse(coordinate.latitude(), coordinate.longitude()),
            )
            .await
            .unwrap_or(Err(ProviderError::Timeout));

            match outcome {
                Ok(place) => return components_from_place(place).ok_or(ResolveError::NoResult),
                Err(failure) => {
                    let delay = self.next_delay(&failure, attempt)?;
                    debug!(attempt, error = %failure, delay_ms = delay.as_millis() as u64, "retrying reverse lookup");
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One search request bounded by the forward timeout. `Ok(None)` means
    /// the provider answered but had nothing valid.
    async fn search_once(&self, text: &str) -> Result<Option<Coordinate>, ProviderError> {
        let query = SearchQuery {
            text: text.to_string(),
            country_code: self.region.country_code.clone(),
            limit: 1,
        };

        let hits = timeout(self.policy.forward_timeout, self.provider.search(&query))
            .await
            .unwrap_or(Err(ProviderError::Timeout))?;

        let coordinate = hits.first().and_then(|hit| {
            let parsed = Coordinate::parse(&hit.lat, &hit.lon);
            if parsed.is_none() {
                warn!(lat = %hit.lat, lon = %hit.lon, "provider returned unusable coordinates");
            }
            parsed
        });

        Ok(coordinate)
    }

    fn next_delay(&self, failure: &ProviderError, attempt: u32) -> Result<Duration, ResolveError> {
        if !failure.is_transient() {
            return Err(ResolveError::Permanent(failure.clone()));
        }

        self.policy
            .delay_for(failure, attempt)
            .ok_or_else(|| ResolveError::Exhausted {
                attempts: attempt,
                last: failure.clone(),
            })
    }
}

fn components_from_place(place: ReversePlace) -> Option<AddressComponents> {
    if place.error.is_some() {
        return None;
    }

    let PlaceAddress {
        house_number,
        road,
        city,
        town,
        village,
        state,
        country,
        postcode,
    } = place.address.unwrap_or_default();

    let street = [road, house_number]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let address = place
        .display_name
        .filter(|name| !name.trim().is_empty())
        .or_else(|| (!street.is_empty()).then_some(street));

    let components = AddressComponents {
        address,
        city: city.or(town).or(village),
        state,
        country,
        pincode: postcode,
    };

    if components == AddressComponents::default() {
        return None;
    }
    Some(components)
}
