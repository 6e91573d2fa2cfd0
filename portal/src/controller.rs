//! Debounced page fetching for one table view.
//!
//! A table UI reports every page/sort/filter change through
//! [`PaginatedFetchController::request_fetch`]. A background tokio task owns
//! the debounce slot; each firing spawns exactly one list request, and the
//! outcome is published through a `tokio::sync::watch` channel.
//!
//! ```text
//!   request_fetch(TableState) --mpsc--> debounce task (pending slot + deadline)
//!                                              |
//!                                  one spawned fetch per firing (seq = n)
//!                                              |
//!                    normalize -> apply if seq > applied_seq
//!                                              |
//!                                watch::Sender<FetchState<T>>
//!                                              |
//!                               consumers: state() / subscribe() / settled()
//! ```
//!
//! Fetch errors never reach the caller. They go to the [`ErrorReporter`]
//! and the previously applied page stays in place.
//!
//! [`ErrorReporter`]: crate::sink::ErrorReporter

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_DEBOUNCE;
use crate::error::{PortalError, Result};
use crate::rest::ListSource;
use crate::sink::{Sinks, DATATABLE_SORT_BY_OR_FILTER};
use crate::types::{PageOptions, PageResult, SortBy, SortKey, TableState};

// ---------------------------------------------------------------------------
// Sort field mapping
// ---------------------------------------------------------------------------

/// Column accessor id -> API ordering key.
#[derive(Debug, Clone, Default)]
pub struct SortFieldMap {
    fields: HashMap<String, String>,
}

impl SortFieldMap {
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Columns of the registered-learners table.
    pub fn registered_learners() -> Self {
        Self::new([
            ("lmsUserCreated", "lms_user_created"),
            ("userEmail", "user_email"),
        ])
    }

    /// Map UI sorts to API sort keys, keeping their order. Columns with no
    /// API key are skipped.
    pub fn resolve(&self, sort_by: &[SortBy]) -> Vec<SortKey> {
        sort_by
            .iter()
            .filter_map(|sort| {
                self.fields.get(&sort.id).map(|key| SortKey {
                    field: key.clone(),
                    descending: sort.desc,
                })
            })
            .collect()
    }

    /// Column id for an API ordering key, if any column maps to it.
    pub fn column_for(&self, api_key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, key)| key.as_str() == api_key)
            .map(|(column, _)| column.as_str())
    }

    /// Table sorts equivalent to a decoded `ordering`, dropping keys no
    /// column maps to.
    pub fn sort_by_for(&self, ordering: &[SortKey]) -> Vec<SortBy> {
        ordering
            .iter()
            .filter_map(|key| {
                self.column_for(&key.field)
                    .map(|column| SortBy::new(column, key.descending))
            })
            .collect()
    }

    /// Translate a table state into request options (`page = page_index + 1`).
    pub fn page_options(&self, state: &TableState) -> PageOptions {
        let mut options = PageOptions::new(state.page_index.saturating_add(1), state.page_size);
        options.ordering = self.resolve(&state.sort_by);
        options.extra_filters = state.filters.clone();
        options
    }
}

// ---------------------------------------------------------------------------
// Published state
// ---------------------------------------------------------------------------

/// Snapshot of a controller, as seen through its `watch` channel.
#[derive(Debug)]
pub struct FetchState<T> {
    /// Most recently applied page. Replaced wholesale, never merged.
    pub result: Arc<PageResult<T>>,
    /// Options that produced `result`, if any page has been applied.
    pub options: Option<PageOptions>,
    /// Fetches finished so far, successful or not.
    pub completed: u64,
    /// Error of the newest failed request, cleared by the next applied page.
    pub last_error: Option<String>,
    in_flight: usize,
    applied_seq: u64,
    /// Calls to `request_fetch` accepted so far.
    requested: u64,
    /// Requests covered by a dispatched fetch.
    dispatched: u64,
}

impl<T> FetchState<T> {
    fn new() -> Self {
        Self {
            result: Arc::new(PageResult::default()),
            options: None,
            completed: 0,
            last_error: None,
            in_flight: 0,
            applied_seq: 0,
            requested: 0,
            dispatched: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// A request is queued or waiting out its debounce window.
    pub fn is_pending(&self) -> bool {
        self.requested > self.dispatched
    }

    /// At least one fetch finished and nothing is pending or in flight.
    pub fn is_settled(&self) -> bool {
        self.completed > 0 && !self.is_pending() && self.in_flight == 0
    }
}

impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        Self {
            result: Arc::clone(&self.result),
            options: self.options.clone(),
            completed: self.completed,
            last_error: self.last_error.clone(),
            in_flight: self.in_flight,
            applied_seq: self.applied_seq,
            requested: self.requested,
            dispatched: self.dispatched,
        }
    }
}

/// Holds `is_loading` up for the lifetime of one request.
///
/// Released on drop, so every exit path of the request task clears the flag.
struct LoadingGuard<T> {
    state_tx: Arc<watch::Sender<FetchState<T>>>,
}

impl<T> LoadingGuard<T> {
    /// Move the first `received` requests into flight. Requests the
    /// debounce task has not received yet stay pending.
    fn acquire(state_tx: Arc<watch::Sender<FetchState<T>>>, received: u64) -> Self {
        state_tx.send_modify(|s| {
            s.dispatched = s.dispatched.max(received);
            s.in_flight += 1;
        });
        Self { state_tx }
    }
}

impl<T> Drop for LoadingGuard<T> {
    fn drop(&mut self) {
        self.state_tx
            .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Static settings for one controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Identifier sent with tracking events (e.g. `registered-unenrolled-learners`).
    pub table_id: String,
    pub debounce: Duration,
    pub sort_fields: SortFieldMap,
}

impl ControllerSettings {
    pub fn new(table_id: impl Into<String>, sort_fields: SortFieldMap) -> Self {
        Self {
            table_id: table_id.into(),
            debounce: DEFAULT_DEBOUNCE,
            sort_fields,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// State shared by the debounce task and the fetch tasks it spawns.
struct Shared<T> {
    settings: ControllerSettings,
    source: Arc<dyn ListSource>,
    sinks: Sinks,
    state_tx: Arc<watch::Sender<FetchState<T>>>,
    has_fetched_once: AtomicBool,
    cancel: CancellationToken,
}

/// Mediates between table-state changes and a remote paginated list.
///
/// Create with [`spawn`](Self::spawn) inside a tokio runtime. Dropping the
/// controller (or calling [`close`](Self::close)) stops the background task
/// and any request still in flight.
pub struct PaginatedFetchController<T> {
    table_id: String,
    request_tx: mpsc::UnboundedSender<TableState>,
    state_tx: Arc<watch::Sender<FetchState<T>>>,
    state_rx: watch::Receiver<FetchState<T>>,
    cancel: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl<T> PaginatedFetchController<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Start the debounce task.
    ///
    /// # Arguments
    ///
    /// * `settings` - Table id, debounce window and sort field mapping.
    /// * `source` - The remote list the controller pages through.
    /// * `sinks` - Analytics and error-reporting collaborators.
    /// * `cancel` - Token scoping the controller; cancelling it tears the
    ///   controller down.
    pub fn spawn(
        settings: ControllerSettings,
        source: Arc<dyn ListSource>,
        sinks: Sinks,
        cancel: CancellationToken,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(FetchState::new());
        let state_tx = Arc::new(state_tx);
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let table_id = settings.table_id.clone();
        let shared = Arc::new(Shared {
            settings,
            source,
            sinks,
            state_tx: Arc::clone(&state_tx),
            has_fetched_once: AtomicBool::new(false),
            cancel: cancel.clone(),
        });

        let handle = tokio::spawn(run_debounce_loop(shared, request_rx));

        Self {
            table_id,
            request_tx,
            state_tx,
            state_rx,
            cancel,
            task_handle: Some(handle),
        }
    }
}

impl<T> PaginatedFetchController<T> {
    /// Queue a fetch for `state`. Calls within the debounce window collapse
    /// into one request carrying the latest state.
    pub fn request_fetch(&self, state: TableState) {
        if self.cancel.is_cancelled() {
            warn!(table = %self.table_id, "fetch requested on a closed controller");
            return;
        }
        self.state_tx.send_modify(|s| s.requested += 1);
        if self.request_tx.send(state).is_err() {
            warn!(table = %self.table_id, "debounce task gone, dropping fetch request");
            self.state_tx
                .send_modify(|s| s.requested = s.requested.saturating_sub(1));
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Current snapshot.
    pub fn state(&self) -> FetchState<T> {
        self.state_rx.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state_rx.borrow().is_loading()
    }

    /// Latest applied page.
    pub fn result(&self) -> Arc<PageResult<T>> {
        Arc::clone(&self.state_rx.borrow().result)
    }

    /// Clone a `watch::Receiver` for async consumption.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state_rx.clone()
    }

    /// Wait until every queued request has finished.
    ///
    /// Returns immediately with the current state if the controller has
    /// been closed.
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.state_rx.clone();
        tokio::select! {
            state = rx.wait_for(FetchState::is_settled) => match state {
                Ok(state) => state.clone(),
                Err(_) => self.state(),
            },
            _ = self.cancel.cancelled() => self.state(),
        }
    }

    /// Stop the debounce task and abandon in-flight requests.
    pub fn close(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for PaginatedFetchController<T> {
    fn drop(&mut self) {
        self.close();
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Owns the pending slot: the latest requested state and its deadline.
async fn run_debounce_loop<T>(
    shared: Arc<Shared<T>>,
    mut request_rx: mpsc::UnboundedReceiver<TableState>,
) where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let debounce = shared.settings.debounce;
    let mut pending: Option<TableState> = None;
    let mut deadline = Instant::now();
    let mut seq = 0u64;
    let mut received = 0u64;

    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => {
                debug!(table = %shared.settings.table_id, "controller shutdown");
                break;
            }
            request = request_rx.recv() => match request {
                Some(state) => {
                    received += 1;
                    pending = Some(state);
                    deadline = Instant::now() + debounce;
                }
                None => break,
            },
            _ = time::sleep_until(deadline), if pending.is_some() => {
                if let Some(state) = pending.take() {
                    seq += 1;
                    dispatch(&shared, &state, seq, received);
                }
            }
        }
    }
}

/// Spawn the single request for one debounce firing. `received` counts the
/// requests folded into this firing and every earlier one.
fn dispatch<T>(shared: &Arc<Shared<T>>, state: &TableState, seq: u64, received: u64)
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let options = shared.settings.sort_fields.page_options(state);
    debug!(
        table = %shared.settings.table_id,
        seq,
        page = options.page,
        page_size = options.page_size,
        ordering = ?options.ordering_param(),
        "dispatching fetch"
    );

    let guard = LoadingGuard::acquire(Arc::clone(&shared.state_tx), received);
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        let _guard = guard;

        // The source runs in its own task so a panic surfaces as a JoinError
        // and is completed like any other failure.
        let source = Arc::clone(&shared.source);
        let request = options.clone();
        let mut fetch_task =
            tokio::spawn(async move { fetch::<T>(source.as_ref(), &request).await });

        let outcome = tokio::select! {
            joined = &mut fetch_task => joined.unwrap_or_else(|err| Err(PortalError::from(err))),
            _ = shared.cancel.cancelled() => {
                fetch_task.abort();
                return;
            }
        };
        complete(&shared, seq, options, outcome);
    });
}

async fn fetch<T: DeserializeOwned>(
    source: &dyn ListSource,
    options: &PageOptions,
) -> Result<PageResult<T>> {
    let raw = source.fetch_page(options).await?;
    PageResult::from_wire(raw, options.page_size)
}

/// Record a finished request. Only responses newer than the applied page
/// replace it.
fn complete<T>(shared: &Shared<T>, seq: u64, options: PageOptions, outcome: Result<PageResult<T>>) {
    let table_id = &shared.settings.table_id;
    let first_fetch = !shared.has_fetched_once.swap(true, Ordering::SeqCst);

    match outcome {
        Ok(page) => {
            let item_count = page.item_count;
            let mut applied = false;
            let applied_options = options.clone();
            shared.state_tx.send_modify(|s| {
                s.completed += 1;
                if seq > s.applied_seq {
                    s.applied_seq = seq;
                    s.result = Arc::new(page);
                    s.options = Some(applied_options);
                    s.last_error = None;
                    applied = true;
                }
            });
            if applied {
                info!(table = %table_id, seq, page = options.page, item_count, "page applied");
            } else {
                debug!(table = %table_id, seq, "dropping stale response");
            }

            // The first fetch is the initial page load, not a user action.
            if !first_fetch {
                shared
                    .sinks
                    .tracker
                    .track(DATATABLE_SORT_BY_OR_FILTER, event_properties(table_id, &options));
            }
        }
        Err(err) => {
            shared.sinks.reporter.log_error(&err);
            let message = err.to_string();
            shared.state_tx.send_modify(|s| {
                s.completed += 1;
                if seq > s.applied_seq {
                    s.last_error = Some(message);
                }
            });
        }
    }
}

/// `{ tableId, page, pageSize, ordering?, search?, ...filters }`
fn event_properties(table_id: &str, options: &PageOptions) -> Value {
    let mut properties = match serde_json::to_value(options) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    properties.insert("tableId".to_string(), Value::String(table_id.to_string()));
    Value::Object(properties)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
