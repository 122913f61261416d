use super::{AgendaPageCrawler, HalApiCrawler, PagedJsonCrawler};
use crate::app::ports::HttpClientPort;
use crate::config::{Config, SourceConfig};
use crate::constants::{DEFAULT_AGENDA_MAX_PAGES, DEFAULT_MAX_PAGES};
use crate::types::{EventApi, SourceKind};
use std::sync::Arc;
use std::time::Duration;

/// Build the crawler for a configured source, or `None` when its family tag
/// is unknown.
pub fn create_crawler(
    source: &SourceConfig,
    config: &Config,
    http: Arc<dyn HttpClientPort>,
) -> Option<Box<dyn EventApi>> {
    let delay = Duration::from_millis(config.page_delay_ms);
    let crawler: Box<dyn EventApi> = match SourceKind::from_tag(&source.kind)? {
        SourceKind::HalApi => Box::new(
            HalApiCrawler::new(http, &source.school, &source.base, &source.url)
                .with_max_pages(source.max_pages(DEFAULT_MAX_PAGES))
                .with_page_delay(delay),
        ),
        SourceKind::PagedJson => Box::new(
            PagedJsonCrawler::new(http, &source.school, &source.base, &source.url)
                .with_page_size(source.page_size())
                .with_max_pages(source.max_pages(DEFAULT_MAX_PAGES))
                .with_lookback_days(source.lookback_days())
                .with_page_delay(delay)
                .with_debug_dir(config.debug_dir()),
        ),
        SourceKind::AgendaPage => Box::new(
            AgendaPageCrawler::new(http, &source.school, &source.url)
                .with_selectors(source.selectors())
                .with_max_pages(source.max_pages(DEFAULT_AGENDA_MAX_PAGES))
                .with_page_delay(delay),
        ),
    };
    Some(crawler)
}
