//! Fire-and-forget analytics and error-reporting collaborators.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::error::PortalError;

/// Emitted when a user pages, sorts or filters a data table.
pub const DATATABLE_SORT_BY_OR_FILTER: &str =
    "edx.ui.enterprise.admin_portal.progress_report.datatable.sort_by_or_filter";

/// Receives analytics events.
pub trait EventTracker: Send + Sync {
    fn track(&self, event_name: &str, properties: Value);
}

/// Receives non-fatal errors caught at a component boundary.
pub trait ErrorReporter: Send + Sync {
    fn log_error(&self, error: &PortalError);
}

/// Routes events and errors into `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventTracker for TracingSink {
    fn track(&self, event_name: &str, properties: Value) {
        info!(event = event_name, %properties, "track");
    }
}

impl ErrorReporter for TracingSink {
    fn log_error(&self, err: &PortalError) {
        error!(error = %err, "reported error");
    }
}

/// The analytics and error sinks handed to every controller.
#[derive(Clone)]
pub struct Sinks {
    pub tracker: Arc<dyn EventTracker>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl Sinks {
    pub fn new(tracker: Arc<dyn EventTracker>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { tracker, reporter }
    }

    /// Both sinks backed by [`TracingSink`].
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink), Arc::new(TracingSink))
    }
}

impl Default for Sinks {
    fn default() -> Self {
        Self::tracing()
    }
}

impl std::fmt::Debug for Sinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sinks").finish_non_exhaustive()
    }
}
