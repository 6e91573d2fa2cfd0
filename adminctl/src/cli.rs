use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// adminctl — operator CLI for the enterprise admin console's list and expiry logic.
#[derive(Parser, Debug)]
#[command(name = "adminctl", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge table options into a URL query string
    Query(QueryArgs),

    /// Fetch one page of unenrolled registered learners
    Learners(LearnersArgs),

    /// Evaluate budget expiry notices
    Expiry(ExpiryArgs),
}

/// Arguments for the `query` subcommand.
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Current query string (leading `?` optional)
    #[arg(default_value = "")]
    pub current: String,

    /// 1-based page number
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Page size
    #[arg(long, default_value = "50")]
    pub page_size: u32,

    /// Ordering, e.g. `-lms_user_created,user_email`
    #[arg(long)]
    pub ordering: Option<String>,

    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// Extra filter as key=value (repeatable)
    #[arg(long = "filter", value_parser = parse_key_val)]
    pub filters: Vec<(String, String)>,
}

/// Arguments for the `learners` subcommand.
#[derive(Parser, Debug)]
pub struct LearnersArgs {
    /// Enterprise customer UUID
    pub enterprise_id: String,

    /// Admin API base URL (falls back to PORTAL_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Table state as a URL query string
    #[arg(long, default_value = "")]
    pub query: String,

    /// Column sort as `column[:desc]` (repeatable; overrides the query's ordering)
    #[arg(long = "sort", value_parser = parse_sort)]
    pub sort: Vec<(String, bool)>,

    /// Write a timestamped CSV with this filename suffix instead of printing JSON
    #[arg(long)]
    pub csv: Option<String>,

    /// Directory for the CSV file
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Debounce window before the request fires (ms)
    #[arg(long, default_value = "300")]
    pub debounce_ms: u64,
}

/// Arguments for the `expiry` subcommand.
#[derive(Parser, Debug)]
pub struct ExpiryArgs {
    /// JSON file holding an array of `{ "id", "end" }` budgets
    pub budgets: PathBuf,

    /// Scope the dismissals belong to (e.g. enterprise customer UUID)
    #[arg(long)]
    pub scope: String,

    /// Dismissal store file
    #[arg(long, default_value = ".adminctl/dismissals.json")]
    pub store: PathBuf,

    /// Evaluate at this RFC 3339 instant instead of now
    #[arg(long)]
    pub at: Option<String>,

    /// Dismiss the modal for the current tier
    #[arg(long)]
    pub dismiss_modal: bool,

    /// Dismiss the alert for the current tier
    #[arg(long)]
    pub dismiss_alert: bool,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

fn parse_sort(raw: &str) -> Result<(String, bool), String> {
    let (column, desc) = match raw.split_once(':') {
        Some((column, "desc")) => (column, true),
        Some((column, "asc")) => (column, false),
        Some((_, dir)) => return Err(format!("unknown sort direction `{dir}`")),
        None => (raw, false),
    };
    if column.is_empty() {
        return Err("empty sort column".into());
    }
    Ok((column.to_string(), desc))
}
