use super::base::{ensure_success, polite_delay};
use super::parsers::{discover_calendar_links, extract_cards, next_page_link, parse_ics, AgendaCard, IcsEvent};
use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::coerce::{format_iso, str_to_utc};
use crate::config::AgendaSelectors;
use crate::constants::{DEFAULT_AGENDA_MAX_PAGES, DEFAULT_PAGE_DELAY_MS};
use crate::error::Result;
use crate::types::{EventApi, RawEventData, SourceKind};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Crawler for HTML agenda pages. Calendar feeds linked from the page are
/// preferred; event cards scraped from the page fill in whatever the feeds
/// did not cover.
pub struct AgendaPageCrawler {
    http: Arc<dyn HttpClientPort>,
    school: String,
    url: String,
    selectors: AgendaSelectors,
    max_pages: usize,
    page_delay: Duration,
}

impl AgendaPageCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>, school: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            http,
            school: school.into(),
            url: url.into(),
            selectors: AgendaSelectors::default(),
            max_pages: DEFAULT_AGENDA_MAX_PAGES,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
        }
    }

    pub fn with_selectors(mut self, selectors: AgendaSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let resp = self.http.get(url, &[]).await?;
        ensure_success(&resp, url)?;
        Ok(resp.text())
    }

    async fn fetch_feeds(&self, links: &[String]) -> Vec<Value> {
        let mut records = Vec::new();
        for link in links {
            polite_delay(self.page_delay).await;
            match self.fetch_html(link).await {
                Ok(body) => {
                    let events = parse_ics(&body);
                    info!("Calendar feed {}: {} events", link, events.len());
                    records.extend(events.iter().map(ics_record));
                }
                Err(e) => warn!("Skipping calendar feed {}: {}", link, e),
            }
        }
        records
    }

    async fn scrape_pages(&self, first_html: String) -> Vec<Value> {
        let mut records = Vec::new();
        let mut html = first_html;
        let mut page_url = self.url.clone();
        let mut visited = HashSet::from([page_url.clone()]);

        for page in 1..=self.max_pages {
            let cards = extract_cards(&html, &self.selectors, &page_url);
            debug!("{} agenda page {}: {} cards", self.school, page, cards.len());
            records.extend(cards.iter().map(card_record));

            if page == self.max_pages {
                break;
            }
            let Some(next) = next_page_link(&html, self.selectors.next.as_deref(), &page_url) else {
                break;
            };
            if !visited.insert(next.clone()) {
                break;
            }
            polite_delay(self.page_delay).await;
            match self.fetch_html(&next).await {
                Ok(body) => {
                    html = body;
                    page_url = next;
                }
                Err(e) => {
                    warn!("Stopping agenda pagination at {}: {}", next, e);
                    break;
                }
            }
        }
        records
    }
}

fn ics_record(ev: &IcsEvent) -> Value {
    json!({
        "title": ev.summary,
        "start": ev.start.as_ref().map(format_iso),
        "end": ev.end.as_ref().map(format_iso),
        "url": ev.link(),
        "location": ev.location,
        "raw_date_text": null,
        "description": ev.description,
        "image_url": null,
        "strategy": "ics",
    })
}

fn card_record(card: &AgendaCard) -> Value {
    json!({
        "title": card.title,
        "start": str_to_utc(&card.date_text).as_ref().map(format_iso),
        "end": null,
        "url": card.url,
        "location": card.location,
        "raw_date_text": card.date_text,
        "description": null,
        "image_url": null,
        "strategy": "html",
    })
}

fn merge_key(record: &Value) -> (String, String) {
    let field = |k: &str| record.get(k).and_then(Value::as_str).unwrap_or_default().to_string();
    (field("title"), field("start"))
}

/// Feed records first, then scraped records whose `(title, start)` was not seen yet
pub fn merge_records(feed: Vec<Value>, scraped: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(feed.len() + scraped.len());
    for record in feed.into_iter().chain(scraped) {
        if seen.insert(merge_key(&record)) {
            merged.push(record);
        }
    }
    merged
}

/// A start URL may point straight at an iCalendar feed instead of a page
fn is_calendar_body(resp: &HttpGetResult, body: &str) -> bool {
    let calendar_type = resp.content_type.to_ascii_lowercase().contains("text/calendar");
    calendar_type
        || body
            .trim_start_matches('\u{feff}')
            .trim_start()
            .get(..15)
            .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"))
}

#[async_trait::async_trait]
impl EventApi for AgendaPageCrawler {
    fn api_name(&self) -> &str {
        &self.school
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AgendaPage
    }

    #[instrument(skip(self), fields(school = %self.school))]
    async fn get_event_list(&self) -> Result<Vec<RawEventData>> {
        let resp = self.http.get(&self.url, &[]).await?;
        ensure_success(&resp, &self.url)?;
        let body = resp.text();
        if is_calendar_body(&resp, &body) {
            let events = parse_ics(&body);
            info!("{}: configured URL is a calendar feed with {} events", self.school, events.len());
            return Ok(events.iter().map(ics_record).collect());
        }

        let html = body;

        let links = discover_calendar_links(&html, &self.url);
        let feed = self.fetch_feeds(&links).await;
        let scraped = self.scrape_pages(html).await;
        info!(
            "{}: {} calendar events, {} scraped cards",
            self.school,
            feed.len(),
            scraped.len()
        );

        Ok(merge_records(feed, scraped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_feed_records() {
        let feed = vec![json!({"title": "Gala", "start": "2025-06-01T19:30:00Z", "strategy": "ics"})];
        let scraped = vec![
            json!({"title": "Gala", "start": "2025-06-01T19:30:00Z", "strategy": "html"}),
            json!({"title": "Gala", "start": null, "strategy": "html"}),
            json!({"title": "Afterwork", "start": "2025-06-02T18:00:00Z", "strategy": "html"}),
        ];
        let merged = merge_records(feed, scraped);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0]["strategy"], "ics");
        assert_eq!(merged[1]["start"], Value::Null);
        assert_eq!(merged[2]["title"], "Afterwork");
    }

    #[test]
    fn test_calendar_body_detection() {
        let resp = |ct: &str| HttpGetResult {
            status: 200,
            bytes: Vec::new(),
            content_type: ct.to_string(),
        };
        assert!(is_calendar_body(&resp("text/calendar; charset=utf-8"), ""));
        assert!(is_calendar_body(&resp("application/octet-stream"), "\u{feff}\r\nbegin:vcalendar\r\n"));
        assert!(!is_calendar_body(&resp("text/html"), "<html>BEGIN:VCALENDAR</html>"));
        assert!(!is_calendar_body(&resp("text/html"), "BEGIN:"));
    }

    #[test]
    fn test_card_record_parses_date_text() {
        let card = AgendaCard {
            title: "Afterwork".into(),
            date_text: "12/03/2025 19:00".into(),
            location: "Paris".into(),
            url: None,
        };
        let record = card_record(&card);
        assert_eq!(record["start"], "2025-03-12T19:00:00Z");
        assert_eq!(record["raw_date_text"], "12/03/2025 19:00");
        assert_eq!(record["strategy"], "html");
    }
}
