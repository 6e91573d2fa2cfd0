use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A column sort as reported by the table UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    /// Column accessor id, e.g. `lmsUserCreated`.
    pub id: String,
    #[serde(default)]
    pub desc: bool,
}

impl SortBy {
    pub fn new(id: impl Into<String>, desc: bool) -> Self {
        Self { id: id.into(), desc }
    }
}

/// Table state emitted on every page/sort/filter change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    /// Zero-based page index.
    pub page_index: u32,
    pub page_size: u32,
    #[serde(default)]
    pub sort_by: Vec<SortBy>,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl TableState {
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
            sort_by: Vec::new(),
            filters: BTreeMap::new(),
        }
    }

    pub fn with_sort(mut self, id: impl Into<String>, desc: bool) -> Self {
        self.sort_by.push(SortBy::new(id, desc));
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}
