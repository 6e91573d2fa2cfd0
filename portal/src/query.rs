//! Two-way mapping between [`PageOptions`] and the address-bar query string.

use url::form_urlencoded;

use crate::config::{PortalConfig, DEFAULT_FILTER_KEYS, DEFAULT_PAGE_SIZE};
use crate::types::{PageOptions, SortKey};

const DEFAULT_PAGE: u32 = 1;

/// Reads table state from a query string and merges table state back into it.
#[derive(Debug, Clone)]
pub struct QueryParamCodec {
    default_page_size: u32,
    filter_keys: Vec<String>,
}

impl Default for QueryParamCodec {
    fn default() -> Self {
        Self::new(
            DEFAULT_PAGE_SIZE,
            DEFAULT_FILTER_KEYS.iter().map(|k| k.to_string()),
        )
    }
}

impl QueryParamCodec {
    /// Create a codec that passes `filter_keys` through [`decode`](Self::decode).
    pub fn new<I, S>(default_page_size: u32, filter_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default_page_size: default_page_size.max(1),
            filter_keys: filter_keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(config.default_page_size, config.filter_keys.iter().cloned())
    }

    /// Registered extra filter keys.
    pub fn filter_keys(&self) -> &[String] {
        &self.filter_keys
    }

    /// Merge `options` onto `current`, keeping unrelated keys in place.
    ///
    /// Empty values delete their key, as do `page=1` and a zero `page` or
    /// `page_size`. Existing keys are overwritten where they stand; new keys
    /// are appended.
    pub fn encode(&self, options: &PageOptions, current: &str) -> String {
        let mut params = parse_pairs(current);

        for (key, value) in options.to_query_pairs() {
            match value {
                Some(v) if key == "page" && v == DEFAULT_PAGE.to_string() => {
                    remove_all(&mut params, &key);
                }
                Some(v) if is_numeric_key(&key) && v == "0" => remove_all(&mut params, &key),
                Some(v) if !v.is_empty() => set(&mut params, key, v),
                _ => remove_all(&mut params, &key),
            }
        }

        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish()
    }

    /// Read [`PageOptions`] from a query string. Never fails: unparsable or
    /// non-positive `page`/`page_size` values fall back to the defaults and
    /// unknown keys are ignored.
    pub fn decode(&self, query: &str) -> PageOptions {
        let params = parse_pairs(query);

        let mut options = PageOptions::new(
            parse_positive(first(&params, "page")).unwrap_or(DEFAULT_PAGE),
            parse_positive(first(&params, "page_size")).unwrap_or(self.default_page_size),
        );
        if let Some(ordering) = first(&params, "ordering") {
            options.ordering = ordering.split(',').filter_map(SortKey::parse).collect();
        }
        options.search = first(&params, "search").map(str::to_string);
        for key in &self.filter_keys {
            if let Some(value) = first(&params, key) {
                options.extra_filters.insert(key.clone(), value.to_string());
            }
        }
        options
    }

    /// Whether `encoded` differs from `current`, i.e. the host should navigate.
    pub fn needs_navigation(encoded: &str, current: &str) -> bool {
        encoded.trim_start_matches('?') != current.trim_start_matches('?')
    }
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

fn is_numeric_key(key: &str) -> bool {
    key == "page" || key == "page_size"
}

/// First value for `key`; later duplicates are ignored.
fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Leading integer of `raw`, ignoring anything after the digits
/// (`2.5` -> 2, `5abc` -> 5). `None` unless the result is positive.
fn parse_positive(raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim_start();
    let unsigned = raw.strip_prefix('+').unwrap_or(raw);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .map_or(unsigned, |end| &unsigned[..end]);
    digits.parse::<u32>().ok().filter(|v| *v > 0)
}

fn set(params: &mut Vec<(String, String)>, key: String, value: String) {
    match params.iter().position(|(k, _)| *k == key) {
        Some(index) => {
            params[index].1 = value;
            let mut seen = 0usize;
            params.retain(|(k, _)| {
                if *k != key {
                    return true;
                }
                seen += 1;
                seen == 1
            });
        }
        None => params.push((key, value)),
    }
}

fn remove_all(params: &mut Vec<(String, String)>, key: &str) {
    params.retain(|(k, _)| k != key);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> QueryParamCodec {
        QueryParamCodec::default()
    }

    #[test]
    fn encode_omits_first_page() {
        let options = PageOptions::new(1, 50);
        let encoded = codec().encode(&options, "");
        assert!(!encoded.contains("page="), "{encoded}");
        assert_eq!(encoded, "page_size=50");
    }

    #[test]
    fn encode_removes_stale_page_when_resetting_to_first() {
        let options = PageOptions::new(1, 50);
        let encoded = codec().encode(&options, "?page=4&page_size=50");
        assert_eq!(encoded, "page_size=50");
    }

    #[test]
    fn fifth_page_survives_round_trip() {
        let options = PageOptions::new(5, 50);
        let decoded = codec().decode(&codec().encode(&options, ""));
        assert_eq!(decoded.page, 5);
    }

    #[test]
    fn round_trip_reproduces_non_default_fields() {
        let mut options = PageOptions::new(3, 25);
        options.ordering = vec![SortKey::desc("lms_user_created"), SortKey::asc("user_email")];
        options.search = Some("ada lovelace".into());
        options
            .extra_filters
            .insert("budget_uuid".into(), "1a2b".into());

        let encoded = codec().encode(&options, "features=beta&page=9");
        let decoded = codec().decode(&encoded);
        assert_eq!(decoded, options);
    }

    #[test]
    fn encode_preserves_unrelated_keys_and_order() {
        let mut options = PageOptions::new(2, 50);
        options.search = Some("x".into());
        let encoded = codec().encode(&options, "?feature=on&page=1&tab=learners");
        assert_eq!(encoded, "feature=on&page=2&tab=learners&page_size=50&search=x");
    }

    #[test]
    fn encode_deletes_falsy_values() {
        let mut options = PageOptions::new(1, 50);
        options.search = Some(String::new());
        let encoded = codec().encode(&options, "search=old&ordering=-user_email");
        assert_eq!(encoded, "page_size=50");
    }

    #[test]
    fn encode_collapses_duplicate_keys() {
        let options = PageOptions::new(2, 10);
        let encoded = codec().encode(&options, "page_size=1&x=y&page_size=2");
        assert_eq!(encoded, "page_size=10&x=y&page=2");
    }

    #[test]
    fn decode_defaults() {
        let options = codec().decode("");
        assert_eq!(options, PageOptions::new(1, 50));
    }

    #[test]
    fn decode_falls_back_on_malformed_numbers() {
        let options = codec().decode("page=abc&page_size=-5");
        assert_eq!(options.page, 1);
        assert_eq!(options.page_size, 50);

        let options = codec().decode("page=0&page_size=0");
        assert_eq!(options.page, 1);
        assert_eq!(options.page_size, 50);
    }

    #[test]
    fn decode_reads_leading_integer() {
        let options = codec().decode("page=2.5&page_size=25abc");
        assert_eq!(options.page, 2);
        assert_eq!(options.page_size, 25);

        let options = codec().decode("page=%207&page_size=+10");
        assert_eq!(options.page, 7);
        assert_eq!(options.page_size, 10);

        let options = codec().decode("page=.5&page_size=99999999999");
        assert_eq!(options.page, 1);
        assert_eq!(options.page_size, 50);
    }

    #[test]
    fn encode_deletes_zero_page_size() {
        let mut options = PageOptions::new(2, 0);
        options.page = 0;
        let encoded = codec().encode(&options, "page=3&page_size=50&tab=x");
        assert_eq!(encoded, "tab=x");
    }

    #[test]
    fn decode_passes_through_registered_filters_only() {
        let options =
            codec().decode("?group_uuid=g1&unknown=1&search=bob&ordering=-user_email,,lms_user_created");
        assert_eq!(options.extra_filters.get("group_uuid").map(String::as_str), Some("g1"));
        assert!(!options.extra_filters.contains_key("unknown"));
        assert_eq!(options.search.as_deref(), Some("bob"));
        assert_eq!(
            options.ordering,
            vec![SortKey::desc("user_email"), SortKey::asc("lms_user_created")]
        );
    }

    #[test]
    fn decode_uses_first_occurrence() {
        let options = codec().decode("page=2&page=7");
        assert_eq!(options.page, 2);
    }

    #[test]
    fn custom_filter_keys_and_page_size() {
        let codec = QueryParamCodec::new(20, ["status"]);
        let options = codec.decode("status=active&budget_uuid=b");
        assert_eq!(options.page_size, 20);
        assert_eq!(codec.filter_keys(), ["status".to_string()]);
        assert_eq!(options.extra_filters.len(), 1);
    }

    #[test]
    fn navigation_needed_only_on_change() {
        assert!(!QueryParamCodec::needs_navigation("page=2", "?page=2"));
        assert!(QueryParamCodec::needs_navigation("page=3", "?page=2"));
    }
}
