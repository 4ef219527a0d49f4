pub mod collection_store;
pub mod discovery_use_case;
pub mod ports;
pub mod session_use_case;

pub use collection_store::{CollectionStore, LoadStatus, ToggleOutcome};
pub use discovery_use_case::DiscoveryUseCase;
pub use ports::{ApiRequest, HttpMethod, TransportPort};
pub use session_use_case::SessionService;
