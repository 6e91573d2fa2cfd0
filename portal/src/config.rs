use std::time::Duration;

/// Quiescence window applied to table-state changes before a fetch fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Page size used when the URL does not carry a usable `page_size`.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Extra filter keys carried through the URL by the console's table views.
pub const DEFAULT_FILTER_KEYS: &[&str] = &[
    "search_course",
    "budget_uuid",
    "group_uuid",
    "search_start_date",
];

/// Configuration for a [`PortalContext`](crate::PortalContext).
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the admin API (e.g. `https://courses.example.com`).
    pub api_base_url: String,
    /// Debounce window for paginated fetch controllers.
    pub debounce: Duration,
    /// Fallback `page_size` when decoding query strings.
    pub default_page_size: u32,
    /// Filter keys the query codec passes through verbatim.
    pub filter_keys: Vec<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            debounce: DEFAULT_DEBOUNCE,
            default_page_size: DEFAULT_PAGE_SIZE,
            filter_keys: DEFAULT_FILTER_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}
