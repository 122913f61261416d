use crate::app::ports::HttpGetResult;
use crate::error::{Result, ScraperError};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

/// Resolve a pagination or feed link against the page it was found on.
///
/// Absolute links are kept, root-relative links are appended to the base
/// origin, anything else goes through a regular URL join.
pub fn join_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with('/') && !href.starts_with("//") {
        let origin = Url::parse(base)
            .ok()
            .map(|u| u.origin().ascii_serialization())
            .filter(|o| o != "null")
            .unwrap_or_else(|| base.trim_end_matches('/').to_string());
        return Some(format!("{}{}", origin, href));
    }
    Url::parse(base).ok()?.join(href).ok().map(String::from)
}

/// Sleep between two requests to the same backend
pub async fn polite_delay(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Turn a non-2xx response into a source failure
pub fn ensure_success(resp: &HttpGetResult, url: &str) -> Result<()> {
    if resp.is_success() {
        Ok(())
    } else {
        Err(ScraperError::Status {
            url: url.to_string(),
            status: resp.status,
        })
    }
}

pub fn parse_json_body(resp: &HttpGetResult) -> Result<Value> {
    Ok(serde_json::from_slice(&resp.bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_variants() {
        let base = "https://alumni.example/fr/agenda";
        assert_eq!(
            join_url(base, "https://other.example/x").as_deref(),
            Some("https://other.example/x")
        );
        assert_eq!(
            join_url(base, "/api/v2/items?page=2").as_deref(),
            Some("https://alumni.example/api/v2/items?page=2")
        );
        assert_eq!(
            join_url(base, "calendar.ics").as_deref(),
            Some("https://alumni.example/fr/calendar.ics")
        );
        assert_eq!(join_url(base, "  "), None);
    }

    #[test]
    fn test_ensure_success_maps_status() {
        let resp = HttpGetResult {
            status: 503,
            bytes: vec![],
            content_type: "text/plain".into(),
        };
        let err = ensure_success(&resp, "https://x.example").unwrap_err();
        assert!(matches!(err, ScraperError::Status { status: 503, .. }));
    }
}
