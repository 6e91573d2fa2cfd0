pub mod casing;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod expiry;
pub mod export;
pub mod query;
pub mod rest;
pub mod sink;
pub mod store;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

// Context + config
pub use config::PortalConfig;
pub use context::PortalContext;
pub use error::{PortalError, Result};

// REST client
pub use rest::{ListEndpoint, ListSource, PortalHttpClient};

// Query string state
pub use query::QueryParamCodec;

// Paginated fetching
pub use controller::{ControllerSettings, FetchState, PaginatedFetchController, SortFieldMap};

// Expiry notices
pub use expiry::{
    ExpiryMonitor, ExpiryNotice, ExpiryNotifier, ExpiryThreshold, ExpiryThresholdEvaluator,
    NoticeChannel,
};

// Collaborators
pub use sink::{ErrorReporter, EventTracker, Sinks, TracingSink};
pub use store::{DismissalStore, FileStore, MemoryStore};

// Data types
pub use types::{
    PageOptions, PageResult, RegisteredLearner, SortBy, SortKey, TableState, TimeBoundedEntity,
};
