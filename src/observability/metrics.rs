use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub geocode_requests_total: IntCounterVec,
    pub geocode_latency_seconds: HistogramVec,
    pub tracking_updates_total: IntCounter,
    pub active_tracking_sessions: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let geocode_requests_total = IntCounterVec::new(
            Opts::new(
                "geocode_requests_total",
                "Address resolutions by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid geocode_requests_total metric");

        let geocode_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "geocode_latency_seconds",
                "Latency of address resolution including retries",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 45.0]),
            &["operation"],
        )
        .expect("valid geocode_latency_seconds metric");

        let tracking_updates_total = IntCounter::new(
            "tracking_updates_total",
            "Agent location updates applied to tracking sessions",
        )
        .expect("valid tracking_updates_total metric");

        let active_tracking_sessions = IntGauge::new(
            "active_tracking_sessions",
            "Currently open tracking sessions",
        )
        .expect("valid active_tracking_sessions metric");

        registry
            .register(Box::new(geocode_requests_total.clone()))
            .expect("register geocode_requests_total");
        registry
            .register(Box::new(geocode_latency_seconds.clone()))
            .expect("register geocode_latency_seconds");
        registry
            .register(Box::new(tracking_updates_total.clone()))
            .expect("register tracking_updates_total");
        registry
            .register(Box::new(active_tracking_sessions.clone()))
            .expect("register active_tracking_sessions");

        Self {
            registry,
            geocode_requests_total,
            geocode_latency_seconds,
            tracking_updates_total,
            active_tracking_sessions,
        }
    }

    pub fn record_resolution(&self, operation: &str, outcome: &str, elapsed_secs: f64) {
        self.geocode_requests_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.geocode_latency_seconds
            .with_label_values(&[operation])
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
