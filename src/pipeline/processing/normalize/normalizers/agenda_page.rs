use super::base::{NormalizerUtils, SourceNormalizer};
use crate::coerce::to_utc;
use crate::constants::ONLINE_LOCATION;
use crate::types::{Event, RawEventData, SourceContext, SourceKind};

const ONLINE_KEYWORDS: &[&str] = &["en ligne", "online", "webinar", "webinaire", "visio", "zoom"];

/// Normalizer for records collected from agenda pages, either calendar
/// feed entries or scraped event cards.
pub struct AgendaPageNormalizer;

impl AgendaPageNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn mentions_online(location: &str) -> bool {
        let lowered = location.to_lowercase();
        ONLINE_KEYWORDS.iter().any(|k| lowered.contains(k))
    }
}

impl Default for AgendaPageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceNormalizer for AgendaPageNormalizer {
    fn normalize(&self, ctx: &SourceContext, data: &RawEventData) -> Event {
        let start = NormalizerUtils::first_present(data, &["start", "raw_date_text"]).and_then(to_utc);
        let end = NormalizerUtils::first_present(data, &["end"]).and_then(to_utc);

        let raw_location = NormalizerUtils::trimmed_text(data, &["location"]).unwrap_or_default();
        let is_online = Self::mentions_online(&raw_location);
        let (location, city) = if is_online {
            (ONLINE_LOCATION.to_string(), None)
        } else {
            let city = NormalizerUtils::city_from_address(&raw_location);
            (raw_location, city)
        };

        Event {
            school: ctx.school.clone(),
            title: NormalizerUtils::title(data, &["title"]),
            start,
            end,
            url: NormalizerUtils::first_str(data, &["url"]),
            location,
            city,
            is_online,
            description: NormalizerUtils::trimmed_text(data, &["description"]),
            image_url: NormalizerUtils::image_url(data, &["image_url"]),
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AgendaPage
    }

    fn name(&self) -> &str {
        "Agenda Page Normalizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::format_iso;
    use serde_json::json;

    fn ctx() -> SourceContext {
        SourceContext::new("ESSEC Alumni", "https://www.essecalumni.com")
    }

    #[test]
    fn test_scraped_card_with_french_date() {
        let raw = json!({
            "title": "Conférence IA",
            "start": null,
            "raw_date_text": "jeudi 5 juin 2025 à 18h30",
            "location": "Maison des Centraliens, 8 rue Jean Goujon, 75008 Paris",
            "url": "https://www.essecalumni.com/fr/event/12",
            "strategy": "html"
        });
        let event = AgendaPageNormalizer::new().normalize(&ctx(), &raw);

        assert_eq!(event.start.map(|d| format_iso(&d)).as_deref(), Some("2025-06-05T18:30:00Z"));
        assert!(!event.is_online);
        assert_eq!(event.city.as_deref(), Some("Paris"));
        assert_eq!(event.url.as_deref(), Some("https://www.essecalumni.com/fr/event/12"));
    }

    #[test]
    fn test_online_keywords() {
        let raw = json!({"title": "Afterwork", "location": "Webinar (Zoom)"});
        let event = AgendaPageNormalizer::new().normalize(&ctx(), &raw);

        assert!(event.is_online);
        assert_eq!(event.location, "En ligne");
        assert_eq!(event.city, None);
    }

    #[test]
    fn test_missing_location_is_on_site_and_empty() {
        let event = AgendaPageNormalizer::new().normalize(&ctx(), &json!({"title": "Gala"}));
        assert!(!event.is_online);
        assert_eq!(event.location, "");
        assert_eq!(event.city, None);
        assert_eq!(event.start, None);
    }
}
