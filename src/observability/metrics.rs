//! Metrics for the event scanner
//!
//! Thin wrappers over the `metrics` facade using Prometheus naming conventions.
//! Until a recorder is installed with [`init`] every call is a no-op.

use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Transport metrics
    TransportRequestsSuccess,
    TransportRequestsError,
    TransportRequestDuration,

    // Discovery metrics
    DiscoveryRunsSuccess,
    DiscoveryRunsError,
    DiscoveryRejectedInFlight,
    DiscoveryEventsFound,

    // Collection metrics
    CollectionLoadsSuccess,
    CollectionLoadsError,
    CollectionEventsLoaded,
    CollectionInconsistent,

    // Watch metrics
    WatchTogglesApplied,
    WatchTogglesFailed,
    WatchTogglesStale,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::TransportRequestsSuccess => "scanner_transport_requests_success_total",
            MetricName::TransportRequestsError => "scanner_transport_requests_error_total",
            MetricName::TransportRequestDuration => "scanner_transport_request_duration_seconds",

            MetricName::DiscoveryRunsSuccess => "scanner_discovery_runs_success_total",
            MetricName::DiscoveryRunsError => "scanner_discovery_runs_error_total",
            MetricName::DiscoveryRejectedInFlight => "scanner_discovery_rejected_in_flight_total",
            MetricName::DiscoveryEventsFound => "scanner_discovery_events_found",

            MetricName::CollectionLoadsSuccess => "scanner_collection_loads_success_total",
            MetricName::CollectionLoadsError => "scanner_collection_loads_error_total",
            MetricName::CollectionEventsLoaded => "scanner_collection_events_loaded",
            MetricName::CollectionInconsistent => "scanner_collection_inconsistent_total",

            MetricName::WatchTogglesApplied => "scanner_watch_toggles_applied_total",
            MetricName::WatchTogglesFailed => "scanner_watch_toggles_failed_total",
            MetricName::WatchTogglesStale => "scanner_watch_toggles_stale_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            TransportRequestsSuccess,
            TransportRequestsError,
            TransportRequestDuration,
            DiscoveryRunsSuccess,
            DiscoveryRunsError,
            DiscoveryRejectedInFlight,
            DiscoveryEventsFound,
            CollectionLoadsSuccess,
            CollectionLoadsError,
            CollectionEventsLoaded,
            CollectionInconsistent,
            WatchTogglesApplied,
            WatchTogglesFailed,
            WatchTogglesStale,
        ]
        .into_iter()
    }
}

static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder so [`render`] has something to show
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Prometheus text snapshot, if [`init`] ran
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Transport Metrics
// ============================================================================

pub mod transport {
    use super::MetricName;
    use crate::error::TransportError;

    pub fn request_success() {
        ::metrics::counter!(MetricName::TransportRequestsSuccess.as_str()).increment(1);
    }

    pub fn request_error(error: &TransportError) {
        let kind = match error {
            TransportError::NetworkFailure(_) => "network",
            TransportError::Timeout(_) => "timeout",
            TransportError::ServerError { .. } => "server",
            TransportError::MalformedResponse(_) => "malformed",
        };
        ::metrics::counter!(MetricName::TransportRequestsError.as_str(), "kind" => kind).increment(1);
    }

    pub fn request_duration(secs: f64) {
        ::metrics::histogram!(MetricName::TransportRequestDuration.as_str()).record(secs);
    }
}

// ============================================================================
// Discovery Metrics
// ============================================================================

pub mod discovery {
    use super::MetricName;

    pub fn run_success(platform: &'static str) {
        ::metrics::counter!(MetricName::DiscoveryRunsSuccess.as_str(), "platform" => platform).increment(1);
    }

    pub fn run_error(platform: &'static str) {
        ::metrics::counter!(MetricName::DiscoveryRunsError.as_str(), "platform" => platform).increment(1);
    }

    pub fn rejected_in_flight() {
        ::metrics::counter!(MetricName::DiscoveryRejectedInFlight.as_str()).increment(1);
    }

    pub fn events_found(count: usize) {
        ::metrics::histogram!(MetricName::DiscoveryEventsFound.as_str()).record(count as f64);
    }
}

// ============================================================================
// Collection Metrics
// ============================================================================

pub mod collection {
    use super::MetricName;

    pub fn load_success(events: usize) {
        ::metrics::counter!(MetricName::CollectionLoadsSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::CollectionEventsLoaded.as_str()).record(events as f64);
    }

    pub fn load_error() {
        ::metrics::counter!(MetricName::CollectionLoadsError.as_str()).increment(1);
    }

    pub fn inconsistent() {
        ::metrics::counter!(MetricName::CollectionInconsistent.as_str()).increment(1);
    }

    pub fn toggle_applied() {
        ::metrics::counter!(MetricName::WatchTogglesApplied.as_str()).increment(1);
    }

    pub fn toggle_failed() {
        ::metrics::counter!(MetricName::WatchTogglesFailed.as_str()).increment(1);
    }

    pub fn toggle_stale() {
        ::metrics::counter!(MetricName::WatchTogglesStale.as_str()).increment(1);
    }
}
