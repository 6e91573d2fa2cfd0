//! `adminctl expiry`: evaluate budget expiry and manage dismissals.

use std::fs;

use chrono::{DateTime, Utc};
use portal::{
    ExpiryMonitor, ExpiryNotifier, ExpiryThresholdEvaluator, FileStore, TimeBoundedEntity,
};
use tracing::info;

use crate::cli::ExpiryArgs;
use crate::error::CliError;

/// Reports channel changes on the log.
struct LogNotifier {
    scope: String,
}

impl ExpiryNotifier for LogNotifier {
    fn modal_open(&self) {
        info!(scope = %self.scope, "expiry modal open");
    }

    fn modal_close(&self) {
        info!(scope = %self.scope, "expiry modal dismissed");
    }

    fn alert_open(&self) {
        info!(scope = %self.scope, "expiry alert open");
    }

    fn alert_close(&self) {
        info!(scope = %self.scope, "expiry alert dismissed");
    }
}

pub fn run_expiry(args: ExpiryArgs) -> Result<(), CliError> {
    let budgets: Vec<TimeBoundedEntity> = serde_json::from_str(&fs::read_to_string(&args.budgets)?)?;
    let now = match &args.at {
        Some(at) => DateTime::parse_from_rfc3339(at)?.with_timezone(&Utc),
        None => Utc::now(),
    };

    let store = FileStore::open(&args.store)?;
    let notifier = LogNotifier {
        scope: args.scope.clone(),
    };
    let mut monitor = ExpiryMonitor::new(ExpiryThresholdEvaluator::new(&args.scope, store), notifier);

    if monitor.refresh(&budgets, now).is_none() {
        info!(budgets = budgets.len(), "no expiry notice");
        println!("null");
        return Ok(());
    }
    if args.dismiss_modal {
        monitor.dismiss_modal()?;
    }
    if args.dismiss_alert {
        monitor.dismiss_alert()?;
    }

    println!("{}", serde_json::to_string_pretty(&monitor.current())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn args(dir: &Path, dismiss_modal: bool) -> ExpiryArgs {
        ExpiryArgs {
            budgets: dir.join("budgets.json"),
            scope: "ent-1".into(),
            store: dir.join("state").join("dismissals.json"),
            at: Some("2024-06-01T00:00:00Z".into()),
            dismiss_modal,
            dismiss_alert: false,
        }
    }

    #[test]
    fn dismissal_persists_to_store_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("budgets.json"),
            r#"[{ "id": "b1", "end": "2024-06-08T00:00:00Z" }]"#,
        )
        .unwrap();

        run_expiry(args(dir.path(), true)).unwrap();

        let saved = fs::read_to_string(dir.path().join("state").join("dismissals.json")).unwrap();
        assert!(saved.contains("seen-budget-expiring-modal-ent-1-imminent"));
        assert!(!saved.contains("alert"));
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("budgets.json"), "[]").unwrap();
        let mut a = args(dir.path(), false);
        a.at = Some("yesterday".into());
        assert!(matches!(run_expiry(a), Err(CliError::Timestamp(_))));
    }
}
