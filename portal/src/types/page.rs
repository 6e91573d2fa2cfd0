use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

use crate::casing::camelize_keys;
use crate::error::Result;

/// Prefix marking a descending sort key on the wire.
pub const DESCENDING_MARKER: char = '-';

/// One entry of an `ordering` parameter, e.g. `-lms_user_created`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parse a single wire key. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix(DESCENDING_MARKER) {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{DESCENDING_MARKER}{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}

/// Pagination, sorting and filtering options for one list request.
///
/// Serializes with camelCase keys and `ordering` as its joined wire string,
/// which is the shape analytics events carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOptions {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    #[serde(
        serialize_with = "serialize_ordering",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ordering: Vec<SortKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub extra_filters: BTreeMap<String, String>,
}

impl PageOptions {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
            ordering: Vec::new(),
            search: None,
            extra_filters: BTreeMap::new(),
        }
    }

    /// The `ordering` parameter value, or `None` when no sort applies.
    pub fn ordering_param(&self) -> Option<String> {
        if self.ordering.is_empty() {
            return None;
        }
        Some(
            self.ordering
                .iter()
                .map(SortKey::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Every option as a query key with its value; `None` or an empty
    /// string means "absent".
    pub fn to_query_pairs(&self) -> Vec<(String, Option<String>)> {
        let mut pairs = vec![
            ("page".to_string(), Some(self.page.to_string())),
            ("page_size".to_string(), Some(self.page_size.to_string())),
            ("ordering".to_string(), self.ordering_param()),
            ("search".to_string(), self.search.clone()),
        ];
        for (key, value) in &self.extra_filters {
            pairs.push((key.clone(), Some(value.clone())));
        }
        pairs
    }

    /// Query parameters for the remote list API (absent values skipped).
    pub fn to_request_query(&self) -> Vec<(String, String)> {
        self.to_query_pairs()
            .into_iter()
            .filter_map(|(key, value)| match value {
                Some(v) if !v.is_empty() => Some((key, v)),
                _ => None,
            })
            .collect()
    }
}

fn serialize_ordering<S: Serializer>(
    ordering: &[SortKey],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let joined = ordering
        .iter()
        .map(SortKey::to_string)
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&joined)
}

/// One page of results, normalized to internal field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub item_count: u64,
    pub page_count: u64,
    pub results: Vec<T>,
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self {
            item_count: 0,
            page_count: 0,
            results: Vec::new(),
        }
    }
}

/// Page envelope after key normalization (`num_pages` -> `numPages`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedPage<T> {
    count: u64,
    #[serde(default)]
    num_pages: Option<u64>,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

impl<T: DeserializeOwned> PageResult<T> {
    /// Normalize a snake_case wire page into a [`PageResult`].
    ///
    /// `page_count` falls back to `ceil(count / page_size)` when the server
    /// does not supply `num_pages`.
    pub fn from_wire(raw: serde_json::Value, page_size: u32) -> Result<Self> {
        let page: NormalizedPage<T> = serde_json::from_value(camelize_keys(raw))?;
        let page_count = page
            .num_pages
            .unwrap_or_else(|| page.count.div_ceil(u64::from(page_size.max(1))));
        Ok(Self {
            item_count: page.count,
            page_count,
            results: page.results,
        })
    }
}
