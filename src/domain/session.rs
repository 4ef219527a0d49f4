use super::event::{null_as_default, Category, Platform};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-session preferences kept by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<Category>,
    pub min_relevance_score: Option<u8>,
    pub platform: Option<Platform>,
    pub notifications: Option<bool>,
    pub theme: Option<String>,
}

/// Partial preference write; unset fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferencesUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_relevance_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl PreferencesUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Session metadata; the backend answers `{}` for a session it cannot find
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStats {
    pub session_id: Option<String>,
    pub created_at: Option<String>,
    pub last_active: Option<String>,
    pub session_age_days: Option<u32>,
    pub watched_events_count: Option<usize>,
    pub location: Option<String>,
    pub preferences: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub version: Option<String>,
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Categories and platforms the backend can classify into and search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryCatalog {
    pub categories: Vec<Category>,
    pub platforms: Vec<Platform>,
}
