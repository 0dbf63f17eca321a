pub mod nominatim;
pub mod normalize;
pub mod resolver;
pub mod retry;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderError;

/// Parameters of one forward search, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub country_code: String,
    pub limit: u8,
}

/// One forward-search hit exactly as the provider reported it.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceAddress {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
}

/// Reverse-lookup payload. Providers answer an unresolvable point with an
/// `error` field instead of an address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReversePlace {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<PlaceAddress>,
    #[serde(default)]
    pub error: Option<String>,
}

/// An address-resolution backend. Implementations perform exactly one
/// request per call; retries and timeouts belong to the resolver.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError>;

    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<ReversePlace, ProviderError>;
}
