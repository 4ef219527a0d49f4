use super::collection::CollectionScope;
use super::event::{Category, Platform};
use crate::error::{Result, ScannerError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Ask the backend to search a platform for events in one location and month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryRequest {
    pub location: String,
    pub platform: Platform,
    pub month: u32,
    pub year: i32,
}

impl DiscoveryRequest {
    pub fn new(location: impl Into<String>, platform: Platform, scope: CollectionScope) -> Self {
        Self {
            location: location.into(),
            platform,
            month: scope.month,
            year: scope.year,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(ScannerError::Validation(
                "Please enter a location to search".to_string(),
            ));
        }
        CollectionScope::new(self.month, self.year)?;
        Ok(())
    }

    pub fn scope(&self) -> CollectionScope {
        CollectionScope {
            month: self.month,
            year: self.year,
        }
    }

    /// JSON body for the discovery endpoint, with the location trimmed
    pub fn into_body(self) -> Value {
        json!({
            "location": self.location.trim(),
            "platform": self.platform,
            "month": self.month,
            "year": self.year,
        })
    }
}

/// Summary handed back to the caller after a discovery run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryOutcome {
    pub message: String,
    pub events_discovered: Option<usize>,
    pub scope: CollectionScope,
    pub collection_refreshed: bool,
    pub refresh_error: Option<String>,
}

/// Body of a discovery response; everything is optional because only `message` is promised
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DiscoveryResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub events: Option<Vec<Value>>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Server-side narrowing of a month collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadFilters {
    pub location: Option<String>,
    pub category: Option<Category>,
    pub min_relevance_score: Option<u8>,
}

impl LoadFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(location) = self.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            query.push(("location".to_string(), location.to_string()));
        }
        if let Some(category) = self.category {
            query.push(("category".to_string(), category.to_string()));
        }
        if let Some(score) = self.min_relevance_score {
            query.push(("min_relevance_score".to_string(), score.to_string()));
        }
        query
    }
}

/// Body of a watch-toggle response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct WatchResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
}
