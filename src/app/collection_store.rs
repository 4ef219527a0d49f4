use crate::app::ports::{ApiRequest, TransportPort};
use crate::constants::{month_events_path, WATCH_EVENT_PATH};
use crate::domain::request::WatchResponse;
use crate::domain::{CollectionScope, EventCollection, LoadFilters, WatchChange};
use crate::error::{Result, ScannerError, TransportError};
use crate::observability::metrics;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of the store's current collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Empty,
    Loading,
    Loaded,
}

/// What a confirmed toggle did to the in-memory collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Server accepted the flag and the collection now shows it
    Applied { watched: bool },
    /// Server accepted the flag, which the collection already showed
    Unchanged { watched: bool },
    /// Server accepted the flag but the event is not in the loaded collection
    NotFound,
    /// A newer toggle for the same event was applied first; this response was dropped
    Stale,
}

#[derive(Debug, Default, Clone, Copy)]
struct WatchVersion {
    issued: u64,
    applied: u64,
    in_flight: u32,
}

struct StoreState {
    current: Option<EventCollection>,
    status: LoadStatus,
    selected: Option<(CollectionScope, LoadFilters)>,
    load_generation: u64,
    applied_generation: u64,
    pending_loads: usize,
    watch_versions: HashMap<String, WatchVersion>,
}

impl StoreState {
    fn settle_status(&mut self) {
        self.status = if self.pending_loads > 0 {
            LoadStatus::Loading
        } else if self.current.is_some() {
            LoadStatus::Loaded
        } else {
            LoadStatus::Empty
        };
    }

    /// Forgets toggle versions for events gone from `current` with nothing in flight
    fn prune_watch_versions(&mut self) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        self.watch_versions
            .retain(|id, version| version.in_flight > 0 || current.find(id).is_some());
    }
}

/// Owner of the canonical month collection.
///
/// `load` replaces the collection wholesale with what the server returned and
/// `toggle_watch` changes one event's flag after the server confirmed it. The
/// state lock is never held across a transport call, so toggles for different
/// events proceed independently and each applies in one locked step.
pub struct CollectionStore {
    transport: Arc<dyn TransportPort>,
    state: Mutex<StoreState>,
}

impl CollectionStore {
    pub fn new(transport: Arc<dyn TransportPort>) -> Self {
        Self {
            transport,
            state: Mutex::new(StoreState {
                current: None,
                status: LoadStatus::Empty,
                selected: None,
                load_generation: 0,
                applied_generation: 0,
                pending_loads: 0,
                watch_versions: HashMap::new(),
            }),
        }
    }

    pub async fn status(&self) -> LoadStatus {
        self.state.lock().await.status
    }

    /// Copy of the current collection for read-only views
    pub async fn snapshot(&self) -> Option<EventCollection> {
        self.state.lock().await.current.clone()
    }

    /// Scope and filters of the most recent `load`
    pub async fn selected(&self) -> Option<(CollectionScope, LoadFilters)> {
        self.state.lock().await.selected.clone()
    }

    /// Fetches `scope` and replaces the current collection with it.
    ///
    /// With overlapping loads, a successful response is adopted unless a newer
    /// load has already been adopted; in that case the caller gets
    /// `LoadSuperseded`. A newer load that fails does not block an older one.
    #[instrument(skip(self, filters), fields(month = scope.month, year = scope.year))]
    pub async fn load(&self, scope: CollectionScope, filters: LoadFilters) -> Result<EventCollection> {
        CollectionScope::new(scope.month, scope.year)?;

        let generation = {
            let mut state = self.state.lock().await;
            state.load_generation += 1;
            state.pending_loads += 1;
            state.status = LoadStatus::Loading;
            state.selected = Some((scope, filters.clone()));
            state.load_generation
        };

        let request = ApiRequest::get(month_events_path(scope.month, scope.year))
            .with_query(filters.to_query());
        let fetched = match self.transport.send(request).await {
            Ok(payload) => serde_json::from_value::<EventCollection>(payload).map_err(ScannerError::from),
            Err(e) => Err(e.into()),
        };

        let mut state = self.state.lock().await;
        state.pending_loads = state.pending_loads.saturating_sub(1);
        let result = match fetched {
            Ok(_) if generation < state.applied_generation => {
                debug!(generation, applied = state.applied_generation, "Newer collection already adopted");
                Err(ScannerError::LoadSuperseded {
                    month: scope.month,
                    year: scope.year,
                })
            }
            Ok(collection) => {
                if !collection.is_consistent() {
                    metrics::collection::inconsistent();
                    warn!(
                        total = collection.total_events(),
                        watched = collection.watched_count(),
                        "Server collection counters or buckets disagree with its event list"
                    );
                }
                metrics::collection::load_success(collection.total_events());
                info!(
                    total_events = collection.total_events(),
                    watched_count = collection.watched_count(),
                    "Loaded event collection"
                );
                state.applied_generation = generation;
                state.current = Some(collection.clone());
                state.prune_watch_versions();
                Ok(collection)
            }
            Err(e) => {
                metrics::collection::load_error();
                warn!(error = %e, "Failed to load event collection");
                Err(e)
            }
        };
        state.settle_status();
        result
    }

    /// Reloads the scope and filters of the most recent `load`
    pub async fn refresh(&self) -> Result<EventCollection> {
        let (scope, filters) = self.selected().await.ok_or_else(|| {
            ScannerError::Validation("No month selected to refresh".to_string())
        })?;
        self.load(scope, filters).await
    }

    pub async fn load_current_month(&self, filters: LoadFilters) -> Result<EventCollection> {
        self.load(CollectionScope::current(), filters).await
    }

    /// Persists `!current_watched` for `event_id`, then mirrors it locally.
    ///
    /// Nothing local changes unless the server call succeeds. Each call takes a
    /// per-event ticket first; a response older than the last applied ticket for
    /// that event is discarded.
    #[instrument(skip(self))]
    pub async fn toggle_watch(&self, event_id: &str, current_watched: bool) -> Result<ToggleOutcome> {
        let watched = !current_watched;

        let ticket = {
            let mut state = self.state.lock().await;
            let version = state.watch_versions.entry(event_id.to_string()).or_default();
            version.issued += 1;
            version.in_flight += 1;
            version.issued
        };

        let request = ApiRequest::post(
            WATCH_EVENT_PATH,
            json!({ "event_id": event_id, "watch_status": watched }),
        );
        let confirmed = match self.transport.send(request).await {
            Ok(payload) => confirm_watch(payload),
            Err(e) => Err(e.into()),
        };

        let mut state = self.state.lock().await;
        let version = state.watch_versions.entry(event_id.to_string()).or_default();
        version.in_flight = version.in_flight.saturating_sub(1);
        if let Err(e) = confirmed {
            metrics::collection::toggle_failed();
            warn!(error = %e, "Watch toggle failed; collection left as it was");
            return Err(e);
        }
        if ticket < version.applied {
            metrics::collection::toggle_stale();
            debug!(ticket, applied = version.applied, "Discarding stale watch response");
            return Ok(ToggleOutcome::Stale);
        }
        version.applied = ticket;

        let Some(collection) = state.current.as_mut() else {
            return Ok(ToggleOutcome::NotFound);
        };
        let outcome = match collection.apply_watch(event_id, watched) {
            WatchChange::Changed => ToggleOutcome::Applied { watched },
            WatchChange::Unchanged => ToggleOutcome::Unchanged { watched },
            WatchChange::Missing => {
                debug!("Event not in the loaded collection; nothing to update");
                ToggleOutcome::NotFound
            }
        };
        if matches!(outcome, ToggleOutcome::Applied { .. }) {
            metrics::collection::toggle_applied();
            info!(watched, watched_count = collection.watched_count(), "Updated watch status");
        }
        Ok(outcome)
    }
}

/// Reads the backend's watch confirmation; an unreadable body is not a confirmation
fn confirm_watch(payload: Value) -> Result<()> {
    let response: WatchResponse = if payload.is_null() {
        WatchResponse::default()
    } else {
        serde_json::from_value(payload)
            .map_err(|e| TransportError::MalformedResponse(format!("watch confirmation: {e}")))?
    };
    if response.success == Some(false) {
        return Err(ScannerError::Rejected {
            message: response
                .message
                .unwrap_or_else(|| "Failed to update watch status".to_string()),
        });
    }
    Ok(())
}
