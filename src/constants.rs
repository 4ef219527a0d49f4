/// Endpoint paths and defaults shared between the transport, the use cases and the CLI

// Events API
pub const DISCOVER_EVENTS_PATH: &str = "/api/events/discover-events";
pub const WATCH_EVENT_PATH: &str = "/api/events/watch";
pub const EVENT_CATEGORIES_PATH: &str = "/api/events/categories";

// Users API
pub const PREFERENCES_PATH: &str = "/api/users/preferences";
pub const SESSION_STATS_PATH: &str = "/api/users/session/stats";

pub const HEALTH_PATH: &str = "/health";

/// Path of the month-scoped collection endpoint
pub fn month_events_path(month: u32, year: i32) -> String {
    format!("/api/events/{month}/{year}")
}

// Defaults used when config.toml does not say otherwise
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SESSION_COOKIE: &str = "ai_events_session";
pub const DEFAULT_SESSION_FILE: &str = ".ai_event_scanner_session";
pub const DEFAULT_LOG_DIR: &str = "logs";

// Environment overrides
pub const ENV_BASE_URL: &str = "EVENT_SCANNER_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "EVENT_SCANNER_TIMEOUT_SECONDS";

/// Sentinel accepted by the category filter to mean "no category restriction"
pub const ALL_CATEGORIES: &str = "All";
