use std::net::SocketAddr;

/// Counter: free-slot searches. Labels: algorithm, outcome.
pub const SEARCHES_TOTAL: &str = "reslot_searches_total";

/// Counter: lifecycle transitions built. Labels: state.
pub const TRANSITIONS_TOTAL: &str = "reslot_transitions_total";

/// Counter: session requests handled. Labels: op, status.
pub const SESSION_REQUESTS_TOTAL: &str = "reslot_session_requests_total";

/// Install the Prometheus exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
