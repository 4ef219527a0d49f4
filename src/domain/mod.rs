// Domain data shapes shared by the use cases, the transport and the CLI

pub mod collection;
pub mod event;
pub mod request;
pub mod session;

pub use collection::{CollectionScope, EventCollection, WatchChange};
pub use event::{Category, Event, Platform};
pub use request::{DiscoveryOutcome, DiscoveryRequest, LoadFilters};
pub use session::{CategoryCatalog, HealthStatus, Preferences, PreferencesUpdate, SessionStats};
