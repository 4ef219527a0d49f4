use crate::app::ports::{ApiRequest, TransportPort};
use crate::constants::{EVENT_CATEGORIES_PATH, HEALTH_PATH, PREFERENCES_PATH, SESSION_STATS_PATH};
use crate::domain::{CategoryCatalog, HealthStatus, Preferences, PreferencesUpdate, SessionStats};
use crate::error::{Result, ScannerError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

/// Session-level calls: preferences, stats, health and the category catalog
pub struct SessionService {
    transport: Arc<dyn TransportPort>,
}

impl SessionService {
    pub fn new(transport: Arc<dyn TransportPort>) -> Self {
        Self { transport }
    }

    #[instrument(skip(self))]
    pub async fn preferences(&self) -> Result<Preferences> {
        let payload = self.transport.send(ApiRequest::get(PREFERENCES_PATH)).await?;
        unwrap_field(payload, "preferences")
    }

    /// Writes only the fields set in `update`; an empty update is rejected before any call.
    #[instrument(skip(self, update))]
    pub async fn update_preferences(&self, update: PreferencesUpdate) -> Result<Preferences> {
        if update.is_empty() {
            return Err(ScannerError::Validation("No preferences provided".to_string()));
        }
        let body = serde_json::to_value(&update)?;
        let payload = self
            .transport
            .send(ApiRequest::put(PREFERENCES_PATH, body))
            .await?;
        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ScannerError::Rejected {
                message: payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Failed to update preferences")
                    .to_string(),
            });
        }
        info!("Preferences updated");
        unwrap_field(payload, "preferences")
    }

    #[instrument(skip(self))]
    pub async fn session_stats(&self) -> Result<SessionStats> {
        let payload = self.transport.send(ApiRequest::get(SESSION_STATS_PATH)).await?;
        unwrap_field(payload, "stats")
    }

    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        let payload = self.transport.send(ApiRequest::get(HEALTH_PATH)).await?;
        Ok(serde_json::from_value(payload)?)
    }

    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<CategoryCatalog> {
        let payload = self
            .transport
            .send(ApiRequest::get(EVENT_CATEGORIES_PATH))
            .await?;
        Ok(serde_json::from_value(payload)?)
    }
}

/// Decodes `payload[field]`, treating a missing or null field as the type's default
fn unwrap_field<T: DeserializeOwned + Default>(mut payload: Value, field: &str) -> Result<T> {
    match payload.get_mut(field).map(Value::take) {
        Some(Value::Null) | None => Ok(T::default()),
        Some(inner) => Ok(serde_json::from_value(inner)?),
    }
}
