use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A learner registered with an enterprise but not enrolled in any course.
///
/// Field names are the camelCase forms produced by key normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredLearner {
    #[serde(default)]
    pub enterprise_customer_user_id: Option<u64>,
    #[serde(default)]
    pub lms_user_id: Option<u64>,
    pub user_email: String,
    #[serde(default)]
    pub lms_user_created: Option<DateTime<Utc>>,
}
