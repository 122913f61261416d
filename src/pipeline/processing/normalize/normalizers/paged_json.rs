use serde_json::Value;

use super::base::{NormalizerUtils, SourceNormalizer};
use crate::coerce::to_utc;
use crate::constants::ONLINE_LOCATION;
use crate::types::{Event, RawEventData, SourceContext, SourceKind};

/// Normalizer for the page-numbered JSON listing (`arts_json`).
/// A null `locations` object means the event is online.
pub struct PagedJsonNormalizer;

impl PagedJsonNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn detail_url(ctx: &SourceContext, data: &Value) -> Option<String> {
        NormalizerUtils::first_str(data, &["web_url", "url", "full_url"]).or_else(|| {
            NormalizerUtils::first_str(data, &["slug", "id"])
                .map(|slug| format!("{}/events/{}", ctx.base_url, slug))
        })
    }
}

impl Default for PagedJsonNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for PagedJsonNormalizer {
    fn normalize(&self, ctx: &SourceContext, data: &RawEventData) -> Event {
        let start = NormalizerUtils::first_present(data, &["start_date", "begin_at", "start_at"])
            .and_then(to_utc);
        let end = NormalizerUtils::first_present(data, &["end_date", "end_at", "end_time"])
            .and_then(to_utc);

        let (location, city, is_online) = match data.get("locations") {
            Some(locations @ Value::Object(_)) => {
                let address = NormalizerUtils::object_text(locations, "address");
                let city = NormalizerUtils::city_from_address(&address);
                (address, city, false)
            }
            _ => (ONLINE_LOCATION.to_string(), None, true),
        };

        Event {
            school: ctx.school.clone(),
            title: NormalizerUtils::title(data, &["title", "name"]),
            start,
            end,
            url: Self::detail_url(ctx, data),
            location,
            city,
            is_online,
            description: NormalizerUtils::trimmed_text(data, &["description", "content"]),
            image_url: NormalizerUtils::image_url(
                data,
                &["cover", "thumbnail", "image", "picture", "cover_url", "image_url"],
            ),
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::PagedJson
    }

    fn name(&self) -> &str {
        "Paged JSON Listing Normalizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::format_iso;
    use serde_json::json;

    fn ctx() -> SourceContext {
        SourceContext::new("Arts et Métiers Alumni", "https://www.arts-et-metiers.asso.fr")
    }

    #[test]
    fn test_null_locations_is_online() {
        let raw = json!({"title": "Webinaire carrière", "locations": null});
        let event = PagedJsonNormalizer::new().normalize(&ctx(), &raw);

        assert!(event.is_online);
        assert_eq!(event.location, "En ligne");
        assert_eq!(event.city, None);
    }

    #[test]
    fn test_missing_locations_is_online() {
        let event = PagedJsonNormalizer::new().normalize(&ctx(), &json!({"name": "Apéro"}));
        assert!(event.is_online);
        assert_eq!(event.title, "Apéro");
    }

    #[test]
    fn test_locations_object_yields_city() {
        let raw = json!({
            "title": "Dîner de promo",
            "locations": {"address": "12 Rue X, 75008 Paris, France"}
        });
        let event = PagedJsonNormalizer::new().normalize(&ctx(), &raw);

        assert!(!event.is_online);
        assert_eq!(event.location, "12 Rue X, 75008 Paris, France");
        assert_eq!(event.city.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_locations_without_address() {
        let raw = json!({"title": "Visite", "locations": {}});
        let event = PagedJsonNormalizer::new().normalize(&ctx(), &raw);

        assert!(!event.is_online);
        assert_eq!(event.location, "");
        assert_eq!(event.city, None);
    }

    #[test]
    fn test_dates_urls_and_images() {
        let raw = json!({
            "id": 77,
            "slug": "diner-de-gala",
            "title": "Dîner de gala",
            "start_date": 1700000000000i64,
            "end_time": "2023-11-14T23:30:00Z",
            "content": " Soirée annuelle ",
            "picture": {"url": "https://cdn.example/gala.png"},
            "locations": null
        });
        let event = PagedJsonNormalizer::new().normalize(&ctx(), &raw);

        assert_eq!(event.start.map(|d| format_iso(&d)).as_deref(), Some("2023-11-14T22:13:20Z"));
        assert_eq!(event.end.map(|d| format_iso(&d)).as_deref(), Some("2023-11-14T23:30:00Z"));
        assert_eq!(
            event.url.as_deref(),
            Some("https://www.arts-et-metiers.asso.fr/events/diner-de-gala")
        );
        assert_eq!(event.description.as_deref(), Some("Soirée annuelle"));
        assert_eq!(event.image_url.as_deref(), Some("https://cdn.example/gala.png"));
    }

    #[test]
    fn test_explicit_url_wins() {
        let raw = json!({"id": 3, "full_url": "https://example.org/e/3"});
        let event = PagedJsonNormalizer::new().normalize(&ctx(), &raw);
        assert_eq!(event.url.as_deref(), Some("https://example.org/e/3"));
    }

    #[test]
    fn test_url_absent_without_identifier() {
        let event = PagedJsonNormalizer::new().normalize(&ctx(), &json!({"title": "x"}));
        assert_eq!(event.url, None);
    }
}
