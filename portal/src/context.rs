use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::PortalConfig;
use crate::controller::{ControllerSettings, PaginatedFetchController, SortFieldMap};
use crate::expiry::{ExpiryMonitor, ExpiryNotifier, ExpiryThresholdEvaluator};
use crate::query::QueryParamCodec;
use crate::rest::{ListEndpoint, ListSource, PortalHttpClient};
use crate::sink::Sinks;
use crate::store::DismissalStore;
use crate::types::RegisteredLearner;

/// Table id reported with registered-learner tracking events.
pub const REGISTERED_LEARNERS_TABLE_ID: &str = "registered-unenrolled-learners";

/// Application-root context.
///
/// Owns the HTTP client, query codec and sinks shared by every view, plus
/// a cancellation scope: each controller created here runs under a child
/// token, so [`shutdown`](Self::shutdown) (or dropping the context) stops
/// them all.
#[derive(Debug)]
pub struct PortalContext {
    config: PortalConfig,
    http_client: PortalHttpClient,
    codec: QueryParamCodec,
    sinks: Sinks,
    cancel: CancellationToken,
}

impl PortalContext {
    /// Create a context that reports through `tracing`.
    pub fn new(config: PortalConfig) -> Self {
        Self::with_sinks(config, Sinks::tracing())
    }

    pub fn with_sinks(config: PortalConfig, sinks: Sinks) -> Self {
        let http_client = PortalHttpClient::new(&config.api_base_url);
        let codec = QueryParamCodec::from_config(&config);
        info!(api = %http_client.base_url(), "portal context created");
        Self {
            config,
            http_client,
            codec,
            sinks,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn http_client(&self) -> &PortalHttpClient {
        &self.http_client
    }

    pub fn codec(&self) -> &QueryParamCodec {
        &self.codec
    }

    pub fn sinks(&self) -> &Sinks {
        &self.sinks
    }

    /// Start a controller for `source` under this context's scope, using the
    /// configured debounce window.
    pub fn paginated_controller<T>(
        &self,
        table_id: &str,
        source: Arc<dyn ListSource>,
        sort_fields: SortFieldMap,
    ) -> PaginatedFetchController<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let settings =
            ControllerSettings::new(table_id, sort_fields).with_debounce(self.config.debounce);
        PaginatedFetchController::spawn(
            settings,
            source,
            self.sinks.clone(),
            self.cancel.child_token(),
        )
    }

    /// Controller for an enterprise's unenrolled registered learners.
    pub fn registered_learners_controller(
        &self,
        enterprise_id: &str,
    ) -> PaginatedFetchController<RegisteredLearner> {
        let endpoint =
            ListEndpoint::unenrolled_registered_learners(self.http_client.clone(), enterprise_id);
        self.paginated_controller(
            REGISTERED_LEARNERS_TABLE_ID,
            Arc::new(endpoint),
            SortFieldMap::registered_learners(),
        )
    }

    /// Expiry monitor for `scope_id` backed by `store`.
    pub fn expiry_monitor<S, N>(&self, scope_id: &str, store: S, notifier: N) -> ExpiryMonitor<S, N>
    where
        S: DismissalStore,
        N: ExpiryNotifier,
    {
        ExpiryMonitor::new(ExpiryThresholdEvaluator::new(scope_id, store), notifier)
    }

    /// Cancel every controller created from this context.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("portal context shutting down");
            self.cancel.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for PortalContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
