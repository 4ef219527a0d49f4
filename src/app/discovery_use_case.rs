use crate::app::collection_store::CollectionStore;
use crate::app::ports::{ApiRequest, TransportPort};
use crate::constants::DISCOVER_EVENTS_PATH;
use crate::domain::request::DiscoveryResponse;
use crate::domain::{CollectionScope, DiscoveryOutcome, DiscoveryRequest, LoadFilters};
use crate::error::{Result, ScannerError};
use crate::observability::metrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Releases the in-flight flag however `discover` exits, including when its future is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Use case for asking the backend to discover events, then reloading that month
pub struct DiscoveryUseCase {
    transport: Arc<dyn TransportPort>,
    store: Arc<CollectionStore>,
    in_flight: AtomicBool,
}

impl DiscoveryUseCase {
    pub fn new(transport: Arc<dyn TransportPort>, store: Arc<CollectionStore>) -> Self {
        Self {
            transport,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one discovery. A second call while one is running fails with
    /// `DiscoveryInFlight` without touching the network, and a failed discovery
    /// never touches the collection store.
    #[instrument(skip(self, request), fields(location = %request.location.trim(), platform = %request.platform))]
    pub async fn discover(&self, request: DiscoveryRequest) -> Result<DiscoveryOutcome> {
        request.validate()?;

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            metrics::discovery::rejected_in_flight();
            warn!("Discovery already running; ignoring overlapping request");
            return Err(ScannerError::DiscoveryInFlight);
        };

        let platform = request.platform.as_str();
        let requested_scope = request.scope();
        info!(month = requested_scope.month, year = requested_scope.year, "Starting event discovery");

        let response = match self.call_discovery(request).await {
            Ok(response) => response,
            Err(e) => {
                metrics::discovery::run_error(platform);
                warn!(error = %e, "Event discovery failed");
                return Err(e);
            }
        };

        let events_discovered = response.events.as_ref().map(Vec::len);
        if let Some(count) = events_discovered {
            metrics::discovery::events_found(count);
        }
        metrics::discovery::run_success(platform);

        let scope = CollectionScope::new(
            response.month.unwrap_or(requested_scope.month),
            response.year.unwrap_or(requested_scope.year),
        )
        .unwrap_or(requested_scope);
        let message = response
            .message
            .unwrap_or_else(|| "Event discovery completed".to_string());
        info!(events_discovered, %scope, "Event discovery completed; refreshing collection");

        let (collection_refreshed, refresh_error) =
            match self.store.load(scope, LoadFilters::default()).await {
                Ok(_) => (true, None),
                Err(e) => {
                    warn!(error = %e, "Collection refresh after discovery failed");
                    (false, Some(e.user_message()))
                }
            };

        Ok(DiscoveryOutcome {
            message,
            events_discovered,
            scope,
            collection_refreshed,
            refresh_error,
        })
    }

    async fn call_discovery(&self, request: DiscoveryRequest) -> Result<DiscoveryResponse> {
        let payload = self
            .transport
            .send(ApiRequest::post(DISCOVER_EVENTS_PATH, request.into_body()))
            .await?;
        let response: DiscoveryResponse = if payload.is_null() {
            DiscoveryResponse::default()
        } else {
            serde_json::from_value(payload)?
        };
        if response.success == Some(false) {
            return Err(ScannerError::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| "Failed to discover events".to_string()),
            });
        }
        Ok(response)
    }
}
