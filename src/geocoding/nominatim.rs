use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ProviderError;
use crate::geocoding::{GeocodingProvider, ReversePlace, SearchHit, SearchQuery};

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim-compatible HTTP backend. The client is shared and owned by
/// the caller.
#[derive(Clone)]
pub struct NominatimProvider {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimProvider {
    pub fn new(client: Client, base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let response = request
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "geocoding provider returned error status");
            return Err(classify_status(status));
        }

        let body = response.text().await.map_err(classify_transport_error)?;
        serde_json::from_str(&body).map_err(|err| ProviderError::Malformed(err.to_string()))
    }
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError> {
        let limit = query.limit.to_string();
        let request = self.client.get(self.endpoint("search")).query(&[
            ("format", "json"),
            ("q", query.text.as_str()),
            ("limit", limit.as_str()),
            ("countrycodes", query.country_code.as_str()),
            ("addressdetails", "1"),
        ]);

        self.fetch(request).await
    }

    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<ReversePlace, ProviderError> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let request = self.client.get(self.endpoint("reverse")).query(&[
            ("format", "json"),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
        ]);

        self.fetch(request).await
    }
}

fn classify_status(status: StatusCode) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited
    } else if status.is_server_error() {
        ProviderError::Server(status.as_u16())
    } else {
        ProviderError::Client(status.as_u16())
    }
}

fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{NominatimProvider, classify_status};
    use crate::error::ProviderError;
    use crate::geocoding::{ReversePlace, SearchHit};

    #[test]
    fn status_codes_map_to_retry_classes() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            ProviderError::RateLimited
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            ProviderError::Server(502)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            ProviderError::Client(403)
        );
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let provider = NominatimProvider::new(
            reqwest::Client::new(),
            "http://localhost:8080/",
            "delivery-locator-test",
        );
        assert_eq!(provider.endpoint("search"), "http://localhost:8080/search");
    }

    #[test]
    fn parses_search_and_reverse_payloads() {
        let hits: Vec<SearchHit> = serde_json::from_str(
            r#"[{"lat": "9.5743", "lon": "77.6799", "display_name": "Krishnankoil", "class": "place"}]"#,
        )
        .unwrap();
        assert_eq!(hits[0].lat, "9.5743");

        let place: ReversePlace = serde_json::from_str(
            r#"{"display_name": "Anna Salai, Chennai", "address": {"road": "Anna Salai", "city": "Chennai", "postcode": "600002"}}"#,
        )
        .unwrap();
        let address = place.address.unwrap();
        assert_eq!(address.city.as_deref(), Some("Chennai"));
        assert_eq!(address.postcode.as_deref(), Some("600002"));

        let unresolved: ReversePlace =
            serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert!(unresolved.error.is_some());
    }
}
