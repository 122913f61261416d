/// Source family tags as they appear in configuration.
/// These select which crawler/normalizer pair handles a source.

pub const HAL_API_KIND: &str = "api_v2_hal";
pub const PAGED_JSON_KIND: &str = "arts_json";
pub const AGENDA_PAGE_KIND: &str = "agenda_page";

/// Location label for events without a physical venue
pub const ONLINE_LOCATION: &str = "En ligne";

/// Title used when a record carries none
pub const UNTITLED_EVENT: &str = "(Sans titre)";

// Request headers shared by every source
pub const ACCEPT_HEADER: &str = "application/json, text/plain, */*";
pub const USER_AGENT: &str = "Mozilla/5.0";

// Pagination defaults
pub const DEFAULT_MAX_PAGES: usize = 200;
pub const DEFAULT_AGENDA_MAX_PAGES: usize = 5;
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 50;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Epoch values above this are milliseconds, below it seconds
pub const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Number of raw items persisted in the page-1 debug sample
pub const DEBUG_SAMPLE_ITEMS: usize = 3;

/// Get all supported source family tags
pub fn get_supported_kinds() -> Vec<&'static str> {
    vec![HAL_API_KIND, PAGED_JSON_KIND, AGENDA_PAGE_KIND]
}
