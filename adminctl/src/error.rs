use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Portal(#[from] portal::PortalError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("no API URL: pass --api-url or set PORTAL_API_URL")]
    MissingApiUrl,

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("interrupted")]
    Interrupted,
}
