use crate::constants::{AGENDA_PAGE_KIND, HAL_API_KIND, PAGED_JSON_KIND};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw event data as returned from external APIs/crawlers
pub type RawEventData = serde_json::Value;

/// Canonical event record produced by every normalizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub school: String,
    pub title: String,
    #[serde(with = "crate::coerce::iso_opt")]
    pub start: Option<DateTime<Utc>>,
    #[serde(with = "crate::coerce::iso_opt")]
    pub end: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub location: String,
    pub city: Option<String>,
    pub is_online: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Backend family: one pagination protocol plus one raw schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Hypermedia JSON API following `_links.next.href`
    HalApi,
    /// JSON listing paginated through a `page` query parameter
    PagedJson,
    /// HTML agenda page with optional calendar feeds
    AgendaPage,
}

impl SourceKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            HAL_API_KIND => Some(Self::HalApi),
            PAGED_JSON_KIND => Some(Self::PagedJson),
            AGENDA_PAGE_KIND => Some(Self::AgendaPage),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::HalApi => HAL_API_KIND,
            Self::PagedJson => PAGED_JSON_KIND,
            Self::AgendaPage => AGENDA_PAGE_KIND,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What a normalizer knows about the source a record came from
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub school: String,
    pub base_url: String,
}

impl SourceContext {
    pub fn new(school: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            school: school.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Core trait that all event data sources must implement
#[async_trait::async_trait]
pub trait EventApi: Send + Sync {
    /// Organization this source belongs to
    fn api_name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Fetch every raw record this source exposes, all pages included
    async fn get_event_list(&self) -> Result<Vec<RawEventData>>;
}
