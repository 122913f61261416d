use super::base::{ensure_success, join_url, parse_json_body, polite_delay};
use crate::app::ports::HttpClientPort;
use crate::constants::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY_MS};
use crate::error::Result;
use crate::types::{EventApi, RawEventData, SourceKind};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Crawler for hypermedia JSON agendas: items under `_embedded.items`,
/// the following page under `_links.next.href`.
pub struct HalApiCrawler {
    http: Arc<dyn HttpClientPort>,
    school: String,
    base: String,
    start_url: String,
    max_pages: usize,
    page_delay: Duration,
}

impl HalApiCrawler {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        school: impl Into<String>,
        base: impl Into<String>,
        start_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            school: school.into(),
            base: base.into().trim_end_matches('/').to_string(),
            start_url: start_url.into(),
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    fn page_items(data: &Value) -> Vec<Value> {
        data.get("_embedded")
            .and_then(|e| e.get("items"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    fn next_link(&self, data: &Value) -> Option<String> {
        let href = data
            .get("_links")
            .and_then(|l| l.get("next"))
            .and_then(|n| n.get("href"))
            .and_then(Value::as_str)?;
        join_url(&self.base, href)
    }
}

#[async_trait::async_trait]
impl EventApi for HalApiCrawler {
    fn api_name(&self) -> &str {
        &self.school
    }

    fn kind(&self) -> SourceKind {
        SourceKind::HalApi
    }

    #[instrument(skip(self), fields(school = %self.school))]
    async fn get_event_list(&self) -> Result<Vec<RawEventData>> {
        let mut items = Vec::new();
        let mut next = Some(self.start_url.clone());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            if pages >= self.max_pages {
                warn!("Page ceiling of {} reached for {}", self.max_pages, self.school);
                break;
            }
            if pages > 0 {
                polite_delay(self.page_delay).await;
            }
            pages += 1;

            let resp = self.http.get(&url, &[]).await?;
            ensure_success(&resp, &url)?;
            let data = parse_json_body(&resp)?;

            let page_items = Self::page_items(&data);
            if let Some(first) = page_items.first().and_then(Value::as_object) {
                debug!("Item keys: {:?}", first.keys().collect::<Vec<_>>());
            }
            info!("{} page {}: {} items", self.school, pages, page_items.len());
            items.extend(page_items);

            next = self.next_link(&data);
        }

        info!("Fetched {} raw items from {} in {} pages", items.len(), self.school, pages);
        Ok(items)
    }
}
