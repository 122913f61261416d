use crate::apis::base::join_url;
use crate::config::AgendaSelectors;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// One event card scraped from an agenda page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgendaCard {
    pub title: String,
    pub date_text: String,
    pub location: String,
    pub url: Option<String>,
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("Ignoring invalid CSS selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Split a selector list at its top-level commas. Commas inside brackets,
/// parentheses or quoted attribute values belong to one alternative.
fn split_selector_list(css: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in css.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&css[start..]);
    parts
}

/// Parse each alternative of a selector list on its own, so one invalid
/// alternative does not discard the rest.
fn alternatives(css: &str) -> Vec<Selector> {
    split_selector_list(css)
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(parse_selector)
        .collect()
}

fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first alternative that yields something non-empty
fn first_text(card: &ElementRef, selectors: &[Selector]) -> String {
    selectors
        .iter()
        .filter_map(|sel| card.select(sel).next())
        .map(|el| element_text(&el))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

/// Like `first_text`, but a machine-readable `datetime` attribute wins over
/// the visible text.
fn first_date(card: &ElementRef, selectors: &[Selector]) -> String {
    selectors
        .iter()
        .filter_map(|sel| card.select(sel).next())
        .map(|el| {
            el.value()
                .attr("datetime")
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| element_text(&el))
        })
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn first_href(card: &ElementRef, selectors: &[Selector], page_url: &str) -> Option<String> {
    if let Some(href) = card.value().attr("href") {
        return join_url(page_url, href);
    }
    selectors
        .iter()
        .filter_map(|sel| card.select(sel).find_map(|el| el.value().attr("href")))
        .find_map(|href| join_url(page_url, href))
}

/// Find calendar feed links: `<link>` tags typed `text/calendar` or pointing
/// at an `.ics` file, and anchors pointing at an `.ics` file.
pub fn discover_calendar_links(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links: Vec<String> = Vec::new();
    let mut push = |href: &str| {
        if let Some(url) = join_url(page_url, href) {
            if !links.contains(&url) {
                links.push(url);
            }
        }
    };

    if let Some(sel) = parse_selector("link[href]") {
        for el in document.select(&sel) {
            let href = el.value().attr("href").unwrap_or_default();
            let is_calendar = el
                .value()
                .attr("type")
                .map(|t| t.eq_ignore_ascii_case("text/calendar"))
                .unwrap_or(false);
            if is_calendar || href.to_lowercase().contains(".ics") {
                push(href);
            }
        }
    }
    if let Some(sel) = parse_selector("a[href]") {
        for el in document.select(&sel) {
            let href = el.value().attr("href").unwrap_or_default();
            if href.to_lowercase().contains(".ics") {
                push(href);
            }
        }
    }
    links
}

/// Scrape event cards. Cards without a title are skipped.
pub fn extract_cards(html: &str, selectors: &AgendaSelectors, page_url: &str) -> Vec<AgendaCard> {
    let document = Html::parse_document(html);
    let Some(card_sel) = parse_selector(&selectors.card) else {
        return Vec::new();
    };
    let title_sel = alternatives(&selectors.title);
    let date_sel = alternatives(&selectors.date);
    let location_sel = selectors.location.as_deref().map(alternatives).unwrap_or_default();
    let link_sel = alternatives(&selectors.link);

    document
        .select(&card_sel)
        .filter_map(|card| {
            let title = first_text(&card, &title_sel);
            if title.is_empty() {
                return None;
            }
            Some(AgendaCard {
                title,
                date_text: first_date(&card, &date_sel),
                location: first_text(&card, &location_sel),
                url: first_href(&card, &link_sel, page_url),
            })
        })
        .collect()
}

/// Link to the following agenda page, if the page has one
pub fn next_page_link(html: &str, selector: Option<&str>, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    alternatives(selector?)
        .iter()
        .filter_map(|sel| document.select(sel).find_map(|el| el.value().attr("href")))
        .find_map(|href| join_url(page_url, href))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><head>
  <link rel="alternate" type="text/calendar" href="/agenda/feed">
  <link rel="stylesheet" href="/style.css">
</head><body>
  <a href="https://alumni.example/export/ALL.ICS">iCal</a>
  <a href="/agenda/feed">duplicate</a>
  <div class="event">
    <h3> Dîner   de gala </h3>
    <time datetime="2025-06-01T19:30:00">1er juin</time>
    <span class="location">Pavillon Ledoyen, 75008 Paris</span>
    <a href="/events/gala">Détails</a>
  </div>
  <div class="event-card">
    <div class="event-card__title">Webinar carrière</div>
    <div class="event-card__date">mardi 12 mars 2025 à 18h</div>
    <div class="event-card__location">En ligne</div>
  </div>
  <div class="event"><p>no title here</p></div>
  <a rel="next" href="?page=2">Suivant</a>
</body></html>"#;

    #[test]
    fn test_selector_list_splits_only_top_level_commas() {
        assert_eq!(
            split_selector_list("a[title='x, y'], :is(h2, h3) .t, [data-x=\"1,2\"]"),
            vec!["a[title='x, y']", " :is(h2, h3) .t", " [data-x=\"1,2\"]"]
        );
        assert_eq!(split_selector_list(".a\\,b, .c"), vec![".a\\,b", " .c"]);
        assert_eq!(split_selector_list(""), vec![""]);
    }

    #[test]
    fn test_attribute_value_with_comma_still_matches() {
        let html = Html::parse_fragment(r#"<p><span title="Lieu, Paris">Maison des X</span></p>"#);
        let selectors = alternatives(r#"span[title="Lieu, Paris"], .missing"#);
        assert_eq!(selectors.len(), 2);
        let root = html.root_element();
        assert_eq!(first_text(&root, &selectors), "Maison des X");
    }

    #[test]
    fn test_discover_calendar_links() {
        let links = discover_calendar_links(PAGE, "https://alumni.example/agenda");
        assert_eq!(
            links,
            vec![
                "https://alumni.example/agenda/feed".to_string(),
                "https://alumni.example/export/ALL.ICS".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_cards_with_default_selectors() {
        let cards = extract_cards(PAGE, &AgendaSelectors::default(), "https://alumni.example/agenda");
        assert_eq!(cards.len(), 2);

        assert_eq!(cards[0].title, "Dîner de gala");
        assert_eq!(cards[0].date_text, "2025-06-01T19:30:00");
        assert_eq!(cards[0].location, "Pavillon Ledoyen, 75008 Paris");
        assert_eq!(cards[0].url.as_deref(), Some("https://alumni.example/events/gala"));

        assert_eq!(cards[1].title, "Webinar carrière");
        assert_eq!(cards[1].date_text, "mardi 12 mars 2025 à 18h");
        assert_eq!(cards[1].location, "En ligne");
        assert_eq!(cards[1].url, None);
    }

    #[test]
    fn test_next_page_link() {
        let next = next_page_link(PAGE, Some("a[rel='next']"), "https://alumni.example/agenda");
        assert_eq!(next.as_deref(), Some("https://alumni.example/agenda?page=2"));
        assert_eq!(next_page_link(PAGE, None, "https://alumni.example/agenda"), None);
        assert_eq!(
            next_page_link("<p>end</p>", Some("a.next"), "https://alumni.example/agenda"),
            None
        );
    }

    #[test]
    fn test_invalid_card_selector_yields_nothing() {
        let selectors = AgendaSelectors {
            card: "[[[".to_string(),
            ..AgendaSelectors::default()
        };
        assert!(extract_cards(PAGE, &selectors, "https://alumni.example/agenda").is_empty());
    }
}
