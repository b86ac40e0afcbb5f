use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: reservations successfully created.
pub const RESERVATIONS_CREATED_TOTAL: &str = "bookslot_reservations_created_total";

/// Counter: creations rejected for overlapping an existing reservation,
/// including losses of the concurrent-append race.
pub const SLOT_CONFLICTS_TOTAL: &str = "bookslot_slot_conflicts_total";

/// Counter: reservation status transitions applied.
pub const STATUS_UPDATES_TOTAL: &str = "bookslot_status_updates_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Counter: confirmation notifications dropped after exhausting retries.
pub const NOTIFY_FAILURES_TOTAL: &str = "bookslot_notify_failures_total";

/// Histogram: WAL append (flush + fsync) duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "bookslot_wal_flush_duration_seconds";

/// Counter: WAL compactions performed.
pub const WAL_COMPACTIONS_TOTAL: &str = "bookslot_wal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
