//! CSV export of table rows.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::types::RegisteredLearner;

/// Header row for [`learner_row`].
pub const LEARNER_HEADERS: &[&str] = &["Email", "Date Joined"];

/// `YYYY-MM-DD-{suffix}`, dated in UTC.
pub fn timestamped_filename(suffix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{suffix}", now.format("%Y-%m-%d"))
}

/// Write `headers` followed by one record per row. Cells containing
/// delimiters or quotes are quoted by the writer.
pub fn write_csv<W, T, F>(writer: W, headers: &[&str], rows: &[T], to_row: F) -> Result<()>
where
    W: Write,
    F: Fn(&T) -> Vec<String>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(to_row(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a timestamped CSV file into `dir` and return its path.
pub fn save_csv<T, F>(
    dir: &Path,
    suffix: &str,
    now: DateTime<Utc>,
    headers: &[&str],
    rows: &[T],
    to_row: F,
) -> Result<PathBuf>
where
    F: Fn(&T) -> Vec<String>,
{
    let path = dir.join(timestamped_filename(suffix, now));
    let file = File::create(&path)?;
    write_csv(file, headers, rows, to_row)?;
    info!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(path)
}

pub fn learner_row(learner: &RegisteredLearner) -> Vec<String> {
    vec![
        learner.user_email.clone(),
        learner
            .lms_user_created
            .map(|created| created.format("%B %-d, %Y").to_string())
            .unwrap_or_default(),
    ]
}
