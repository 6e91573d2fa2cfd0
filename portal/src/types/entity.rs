use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Anything with an end boundary: subsidy budgets, subscription plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBoundedEntity {
    pub id: String,
    #[serde(alias = "end_timestamp", alias = "endTimestamp", alias = "expiration_date")]
    pub end: DateTime<Utc>,
}

impl TimeBoundedEntity {
    pub fn new(id: impl Into<String>, end: DateTime<Utc>) -> Self {
        Self { id: id.into(), end }
    }

    /// Build from an RFC 3339 end timestamp.
    pub fn parse(id: impl Into<String>, end: &str) -> Result<Self> {
        let end = DateTime::parse_from_rfc3339(end)?.with_timezone(&Utc);
        Ok(Self::new(id, end))
    }
}
