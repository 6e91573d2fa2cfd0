//! `adminctl learners`: drive a registered-learners controller for one page.

use std::time::Duration;

use chrono::Utc;
use portal::export::{learner_row, save_csv, LEARNER_HEADERS};
use portal::{
    PageOptions, PortalConfig, PortalContext, QueryParamCodec, SortBy, SortFieldMap, TableState,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::LearnersArgs;
use crate::error::CliError;

/// Env var consulted when `--api-url` is absent.
pub const API_URL_ENV: &str = "PORTAL_API_URL";

pub async fn run_learners(args: LearnersArgs, cancel: CancellationToken) -> Result<(), CliError> {
    let api_base_url = args
        .api_url
        .clone()
        .or_else(|| std::env::var(API_URL_ENV).ok())
        .filter(|url| !url.trim().is_empty())
        .ok_or(CliError::MissingApiUrl)?;

    let config = PortalConfig {
        api_base_url,
        debounce: Duration::from_millis(args.debounce_ms),
        ..Default::default()
    };
    let ctx = PortalContext::new(config);

    let decoded = ctx.codec().decode(&args.query);
    let state = table_state(&decoded, &args.sort, &SortFieldMap::registered_learners());
    info!(
        enterprise = %args.enterprise_id,
        page = decoded.page,
        page_size = decoded.page_size,
        sorts = state.sort_by.len(),
        "fetching registered learners"
    );

    let controller = ctx.registered_learners_controller(&args.enterprise_id);
    controller.request_fetch(state);

    let fetched = tokio::select! {
        fetched = controller.settled() => fetched,
        _ = cancel.cancelled() => {
            ctx.shutdown();
            return Err(CliError::Interrupted);
        }
    };
    if let Some(err) = fetched.last_error {
        return Err(CliError::Fetch(err));
    }

    if let Some(applied) = &fetched.options {
        let encoded = ctx.codec().encode(applied, &args.query);
        if QueryParamCodec::needs_navigation(&encoded, &args.query) {
            info!(query = %encoded, "table state query");
        }
    }

    let page = fetched.result;
    match &args.csv {
        Some(suffix) => {
            let path = save_csv(
                &args.out_dir,
                suffix,
                Utc::now(),
                LEARNER_HEADERS,
                &page.results,
                learner_row,
            )?;
            println!("{}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&*page)?),
    }

    ctx.shutdown();
    Ok(())
}

/// Rebuild the table state a decoded URL describes. Explicit `--sort`
/// columns win over the URL's `ordering`.
fn table_state(decoded: &PageOptions, sort: &[(String, bool)], fields: &SortFieldMap) -> TableState {
    let mut state = TableState::new(decoded.page.saturating_sub(1), decoded.page_size);
    state.sort_by = if sort.is_empty() {
        fields.sort_by_for(&decoded.ordering)
    } else {
        sort.iter()
            .map(|(column, desc)| SortBy::new(column.as_str(), *desc))
            .collect()
    };
    state.filters = decoded.extra_filters.clone();
    state
}
