use super::base::{ensure_success, parse_json_body, polite_delay};
use crate::app::ports::HttpClientPort;
use crate::constants::{
    DEBUG_SAMPLE_ITEMS, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY_MS,
    DEFAULT_PAGE_SIZE,
};
use crate::error::{Result, ScraperError};
use crate::types::{EventApi, RawEventData, SourceKind};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const RAW_DEBUG_FILE: &str = "arts_raw_p1.json";
const ITEMS_DEBUG_FILE: &str = "arts_items_p1.json";

/// Query parameters this crawler owns; any copy already on the configured
/// URL is replaced.
const INJECTED_PARAMS: &[&str] = &[
    "include_network_events",
    "query[pinned_on_index_page]",
    "query[order]",
    "per_page",
    "query[gte_start_date]",
    "page",
];

/// Crawler for JSON listings paginated with a `page` query parameter.
///
/// Stops on HTTP 400, on an empty page, on a page shorter than `per_page`,
/// or at the page ceiling, whichever comes first.
pub struct PagedJsonCrawler {
    http: Arc<dyn HttpClientPort>,
    school: String,
    base: String,
    url: String,
    page_size: usize,
    max_pages: usize,
    lookback_days: i64,
    page_delay: Duration,
    debug_dir: Option<PathBuf>,
}

impl PagedJsonCrawler {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        school: impl Into<String>,
        base: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            school: school.into(),
            base: base.into().trim_end_matches('/').to_string(),
            url: url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            debug_dir: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    fn page_url(&self, page: usize, gte_start_ms: i64) -> Result<String> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            ScraperError::Config(format!("Invalid source URL '{}': {}", self.url, e))
        })?;
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !INJECTED_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("include_network_events", "true")
            .append_pair("query[pinned_on_index_page]", "false")
            .append_pair("query[order]", "asc")
            .append_pair("per_page", &self.page_size.to_string())
            .append_pair("query[gte_start_date]", &gte_start_ms.to_string())
            .append_pair("page", &page.to_string());
        Ok(url.into())
    }

    /// Items of one page: the `events` array of an object envelope, or a bare array
    pub fn extract_items(data: &Value) -> Vec<Value> {
        match data {
            Value::Array(items) => items.clone(),
            Value::Object(map) => map
                .get("events")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn write_debug(&self, raw: &Value, items: &[Value]) {
        let Some(dir) = &self.debug_dir else {
            return;
        };
        let sample: Vec<&Value> = items.iter().take(DEBUG_SAMPLE_ITEMS).collect();
        let outcome = fs::create_dir_all(dir)
            .map_err(ScraperError::from)
            .and_then(|_| write_pretty(&dir.join(RAW_DEBUG_FILE), raw))
            .and_then(|_| write_pretty(&dir.join(ITEMS_DEBUG_FILE), &sample));
        match outcome {
            Ok(()) => debug!("Wrote page-1 debug artifacts to {}", dir.display()),
            Err(e) => warn!("Could not write debug artifacts to {}: {}", dir.display(), e),
        }
    }
}

/// Epoch milliseconds of `now` minus the lookback window. A window chrono
/// cannot represent is a configuration error for this source only.
pub fn lookback_start_ms(now: DateTime<Utc>, days: i64) -> Result<i64> {
    chrono::Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .map(|start| start.timestamp_millis())
        .ok_or_else(|| ScraperError::Config(format!("lookback_days {} is out of range", days)))
}

fn write_pretty<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(path, body)?;
    Ok(())
}

#[async_trait::async_trait]
impl EventApi for PagedJsonCrawler {
    fn api_name(&self) -> &str {
        &self.school
    }

    fn kind(&self) -> SourceKind {
        SourceKind::PagedJson
    }

    #[instrument(skip(self), fields(school = %self.school))]
    async fn get_event_list(&self) -> Result<Vec<RawEventData>> {
        let gte_start_ms = lookback_start_ms(Utc::now(), self.lookback_days)?;
        let referer = format!("{}/events", self.base);
        let headers = [("Referer", referer.as_str())];
        let mut all = Vec::new();

        for page in 1..=self.max_pages {
            if page > 1 {
                polite_delay(self.page_delay).await;
            }
            let url = self.page_url(page, gte_start_ms)?;
            let resp = self.http.get(&url, &headers).await?;

            if resp.status == 400 {
                info!("{} page {}: HTTP 400, end of data", self.school, page);
                break;
            }
            ensure_success(&resp, &url)?;

            let data = parse_json_body(&resp)?;
            let items = Self::extract_items(&data);
            if page == 1 {
                self.write_debug(&data, &items);
            }
            info!("{} page {}: {} items", self.school, page, items.len());

            if items.is_empty() {
                break;
            }
            let last_page = items.len() < self.page_size;
            all.extend(items);
            if last_page {
                break;
            }
            if page == self.max_pages {
                warn!("Page ceiling of {} reached for {}", self.max_pages, self.school);
            }
        }

        info!("Fetched {} raw items from {}", all.len(), self.school);
        Ok(all)
    }
}
