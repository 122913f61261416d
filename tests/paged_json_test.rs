mod common;

use alumni_agenda::apis::PagedJsonCrawler;
use alumni_agenda::error::ScraperError;
use alumni_agenda::types::EventApi;
use chrono::Utc;
use common::{query_param, ScriptedHttp};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const BASE: &str = "https://www.arts-et-metiers.asso.fr";
const URL: &str = "https://www.arts-et-metiers.asso.fr/events.json";

fn items(range: std::ops::Range<usize>) -> Value {
    Value::Array(range.map(|i| json!({"id": i, "title": format!("Event {i}")})).collect())
}

fn crawler(http: Arc<ScriptedHttp>) -> PagedJsonCrawler {
    PagedJsonCrawler::new(http, "Arts et Métiers Alumni", BASE, URL)
        .with_page_size(3)
        .with_page_delay(Duration::ZERO)
}

#[tokio::test]
async fn short_page_ends_pagination() {
    let http = Arc::new(
        ScriptedHttp::new()
            .json_page(URL, 1, 200, json!({"events": items(0..3)}))
            .json_page(URL, 2, 200, json!({"events": items(3..5)}))
            .json_page(URL, 3, 200, json!({"events": items(5..8)})),
    );

    let all = crawler(http.clone()).get_event_list().await.unwrap();

    assert_eq!(all.len(), 5);
    let pages: Vec<String> = http
        .urls()
        .iter()
        .filter_map(|u| query_param(u, "page"))
        .collect();
    assert_eq!(pages, vec!["1", "2"]);
}

#[tokio::test]
async fn http_400_ends_without_error() {
    let http = Arc::new(
        ScriptedHttp::new()
            .json_page(URL, 1, 200, items(0..3))
            .json_page(URL, 2, 400, json!({"error": "page out of range"})),
    );

    let all = crawler(http.clone()).get_event_list().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(http.urls().len(), 2);
}

#[tokio::test]
async fn empty_page_ends_pagination() {
    let http = Arc::new(
        ScriptedHttp::new()
            .json_page(URL, 1, 200, items(0..3))
            .json_page(URL, 2, 200, json!({"events": []})),
    );

    let all = crawler(http.clone()).get_event_list().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(http.urls().len(), 2);
}

#[tokio::test]
async fn other_error_status_fails_the_source() {
    let http = Arc::new(ScriptedHttp::new().json_page(URL, 1, 500, json!({})));

    let err = crawler(http).get_event_list().await.unwrap_err();
    assert!(matches!(err, ScraperError::Status { status: 500, .. }));
}

#[tokio::test]
async fn sends_referer_and_query_window() {
    let http = Arc::new(ScriptedHttp::new().json_page(URL, 1, 200, items(0..1)));
    let before = Utc::now();

    crawler(http.clone())
        .with_lookback_days(7)
        .get_event_list()
        .await
        .unwrap();

    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].headers,
        vec![("Referer".to_string(), format!("{BASE}/events"))]
    );

    let url = &requests[0].url;
    assert_eq!(query_param(url, "per_page").as_deref(), Some("3"));
    assert_eq!(query_param(url, "query[order]").as_deref(), Some("asc"));
    assert_eq!(query_param(url, "include_network_events").as_deref(), Some("true"));
    let gte: i64 = query_param(url, "query[gte_start_date]").unwrap().parse().unwrap();
    let expected = (before - chrono::Duration::days(7)).timestamp_millis();
    assert!((gte - expected).abs() < 60_000);
}

#[tokio::test]
async fn writes_page_one_debug_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let debug_dir = dir.path().join("debug");
    let http = Arc::new(ScriptedHttp::new().json_page(URL, 1, 200, json!({"events": items(0..2)})));

    crawler(http)
        .with_debug_dir(Some(debug_dir.clone()))
        .get_event_list()
        .await
        .unwrap();

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(debug_dir.join("arts_raw_p1.json")).unwrap()).unwrap();
    assert_eq!(raw["events"].as_array().unwrap().len(), 2);

    let sample = std::fs::read_to_string(debug_dir.join("arts_items_p1.json")).unwrap();
    assert!(sample.contains("\n  "), "pretty-printed");
    let sample: Value = serde_json::from_str(&sample).unwrap();
    assert_eq!(sample.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn debug_sample_is_capped_at_three_items() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(
        ScriptedHttp::new()
            .json_page(URL, 1, 200, items(0..3))
            .json_page(URL, 2, 200, items(3..4)),
    );

    crawler(http)
        .with_page_size(3)
        .with_debug_dir(Some(dir.path().to_path_buf()))
        .get_event_list()
        .await
        .unwrap();

    let sample: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("arts_items_p1.json")).unwrap()).unwrap();
    assert_eq!(sample.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn page_ceiling_stops_on_full_pages() {
    let http = Arc::new(
        ScriptedHttp::new()
            .json_page(URL, 1, 200, items(0..3))
            .json_page(URL, 2, 200, items(3..6))
            .json_page(URL, 3, 200, items(6..9)),
    );

    let all = crawler(http.clone()).with_max_pages(2).get_event_list().await.unwrap();

    assert_eq!(all.len(), 6);
    let pages: Vec<String> = http
        .urls()
        .iter()
        .filter_map(|u| query_param(u, "page"))
        .collect();
    assert_eq!(pages, vec!["1", "2"]);
}

#[tokio::test]
async fn unrepresentable_lookback_is_a_config_error() {
    let http = Arc::new(ScriptedHttp::new().json_page(URL, 1, 200, items(0..1)));

    let err = crawler(http.clone())
        .with_lookback_days(200_000_000_000)
        .get_event_list()
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::Config(_)));
    assert!(http.urls().is_empty());
}
