use serde_json::Value;

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::coerce::{concat_address, to_utc};
use crate::constants::ONLINE_LOCATION;
use crate::types::{Event, RawEventData, SourceContext, SourceKind};

/// Normalizer for the hypermedia agenda API (`api_v2_hal`).
///
/// Records carry `is_on_site`/`is_webinar` flags and, for on-site events, a
/// structured address under `_embedded.address`.
pub struct HalApiNormalizer;

impl HalApiNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn detail_url(ctx: &SourceContext, data: &Value) -> Option<String> {
        if let Some(url) = NormalizerUtils::first_str(data, &["web_url", "url"]) {
            return Some(url);
        }
        NormalizerUtils::first_str(data, &["id"])
            .filter(|id| !id.is_empty())
            .map(|id| format!("{}/fr/calendar/index/index?id={}", ctx.base_url, id))
    }
}

impl Default for HalApiNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for HalApiNormalizer {
    fn normalize(&self, ctx: &SourceContext, data: &RawEventData) -> Event {
        let start = NormalizerUtils::first_present(data, &["begin_at", "beginAt", "date"])
            .and_then(to_utc);
        let end = NormalizerUtils::first_present(data, &["end_at", "endAt"]).and_then(to_utc);

        let is_on_site = NormalizerUtils::flag(data, "is_on_site");
        let is_webinar = NormalizerUtils::flag(data, "is_webinar");
        let is_online = !is_on_site || is_webinar;

        // The address object is only filled in for on-site events
        let address = data
            .get("_embedded")
            .and_then(|e| e.get("address"))
            .filter(|a| a.is_object())
            .cloned()
            .unwrap_or(Value::Null);
        let city = NormalizerUtils::object_text(&address, "city");

        let location = if is_online {
            ONLINE_LOCATION.to_string()
        } else {
            concat_address(&[
                NormalizerUtils::object_text(&address, "venue"),
                NormalizerUtils::object_text(&address, "address"),
                NormalizerUtils::object_text(&address, "address_2"),
                NormalizerUtils::object_text(&address, "zip"),
                city.clone(),
                NormalizerUtils::object_text(&address, "country_iso"),
            ])
        };

        Event {
            school: ctx.school.clone(),
            title: NormalizerUtils::title(data, &["title"]),
            start,
            end,
            url: Self::detail_url(ctx, data),
            location,
            city: Some(city).filter(|c| !c.is_empty()),
            is_online,
            description: NormalizerUtils::trimmed_text(data, &["description"]),
            image_url: NormalizerUtils::image_url(data, &["cover", "thumbnail"]),
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::HalApi
    }

    fn name(&self) -> &str {
        "Hypermedia Agenda API Normalizer"
    }
}
