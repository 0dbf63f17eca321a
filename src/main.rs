use std::sync::Arc;
use std::time::Duration;

use delivery_locator::api;
use delivery_locator::config::{self, PositionSourceKind};
use delivery_locator::error::AppError;
use delivery_locator::geocoding::nominatim::NominatimProvider;
use delivery_locator::geocoding::resolver::AddressResolver;
use delivery_locator::location::auto::AutoLocator;
use delivery_locator::location::cache::LocationCache;
use delivery_locator::location::ip_api::{self, IpApiPositionSource};
use delivery_locator::location::{FixedPositionSource, PositionSource};
use delivery_locator::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

    let provider = NominatimProvider::new(
        http.clone(),
        config.geocoder_base_url.clone(),
        config.geocoder_user_agent.clone(),
    );
    let resolver = AddressResolver::new(Arc::new(provider), config.region.clone())
        .with_policy(config.retry.clone());

    let source: Arc<dyn PositionSource> = match &config.position_source {
        PositionSourceKind::IpApi => {
            Arc::new(IpApiPositionSource::new(http, ip_api::DEFAULT_ENDPOINT))
        }
        PositionSourceKind::Fixed(position) => Arc::new(FixedPositionSource::new(*position)),
    };
    let locator = AutoLocator::new(
        source,
        resolver.clone(),
        LocationCache::new(config.location_cache_path.clone()),
    )
    .with_options(config.position_options);

    let state = Arc::new(AppState::new(
        resolver,
        locator,
        config.map.clone(),
        config.event_buffer_size,
    ));
    let app = api::rest::router(state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        geocoder = %config.geocoder_base_url,
        country = %config.region.country_code,
        max_attempts = config.retry.max_attempts,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
