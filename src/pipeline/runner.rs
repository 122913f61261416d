use crate::apis::create_crawler;
use crate::app::ports::HttpClientPort;
use crate::config::{Config, SourceConfig};
use crate::pipeline::processing::normalize::NormalizationRegistry;
use crate::types::{Event, SourceContext, SourceKind};
use metrics::{counter, histogram};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Outcome of one source within a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Failed(String),
    Skipped(String),
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Ok => f.write_str("ok"),
            SourceStatus::Failed(reason) => write!(f, "failed: {}", reason),
            SourceStatus::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub school: String,
    pub kind: String,
    pub raw_count: usize,
    pub event_count: usize,
    pub status: SourceStatus,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub events: Vec<Event>,
    pub reports: Vec<SourceReport>,
}

impl PipelineResult {
    pub fn failed_sources(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.status, SourceStatus::Failed(_)))
            .count()
    }
}

/// Drives every configured source in turn: fetch, normalize, collect.
pub struct Pipeline {
    http: Arc<dyn HttpClientPort>,
    registry: NormalizationRegistry,
}

impl Pipeline {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            registry: NormalizationRegistry::new(),
        }
    }

    pub fn with_registry(mut self, registry: NormalizationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run all sources of `config` sequentially. A failing source is reported
    /// and skipped; the run itself never fails.
    pub async fn run(&self, config: &Config) -> PipelineResult {
        let started = Instant::now();
        let mut events = Vec::new();
        let mut reports = Vec::with_capacity(config.sources.len());

        for source in &config.sources {
            let (report, source_events) = self.run_source(source, config).await;
            events.extend(source_events);
            reports.push(report);
        }

        sort_events(&mut events);
        if config.dedupe {
            let before = events.len();
            events = dedupe_events(events);
            info!("Deduplicated {} -> {} events", before, events.len());
        }

        info!(
            "🏁 Collected {} events from {} sources in {:.2}s",
            events.len(),
            reports.len(),
            started.elapsed().as_secs_f64()
        );
        PipelineResult { events, reports }
    }

    #[instrument(skip(self, source, config), fields(school = %source.school, kind = %source.kind))]
    async fn run_source(&self, source: &SourceConfig, config: &Config) -> (SourceReport, Vec<Event>) {
        let mut report = SourceReport {
            school: source.school.clone(),
            kind: source.kind.clone(),
            raw_count: 0,
            event_count: 0,
            status: SourceStatus::Ok,
        };
        counter!("alumni_source_runs_total", "school" => source.school.clone()).increment(1);

        let Some(kind) = SourceKind::from_tag(&source.kind) else {
            warn!("Unknown source family '{}' for {}, skipping", source.kind, source.school);
            report.status = SourceStatus::Skipped(format!("unknown source family '{}'", source.kind));
            return (report, Vec::new());
        };
        let Some(crawler) = create_crawler(source, config, Arc::clone(&self.http)) else {
            report.status = SourceStatus::Skipped(format!("no crawler for '{}'", kind));
            return (report, Vec::new());
        };

        info!("📡 Fetching events from {} ({})", source.school, kind);
        let t_fetch = Instant::now();
        let fetched = crawler.get_event_list().await;
        histogram!("alumni_fetch_duration_seconds", "school" => source.school.clone())
            .record(t_fetch.elapsed().as_secs_f64());

        let raw = match fetched {
            Ok(raw) => raw,
            Err(e) => {
                error!("❌ {} failed: {}", source.school, e);
                counter!("alumni_source_failures_total", "school" => source.school.clone()).increment(1);
                report.status = SourceStatus::Failed(e.to_string());
                return (report, Vec::new());
            }
        };
        report.raw_count = raw.len();

        let ctx = SourceContext::new(&source.school, &source.base);
        let Some(events) = self.registry.normalize_all(kind, &ctx, &raw) else {
            warn!("No normalizer registered for {}", kind);
            report.status = SourceStatus::Skipped(format!("no normalizer for '{}'", kind));
            return (report, Vec::new());
        };
        report.event_count = events.len();
        counter!("alumni_events_normalized_total", "school" => source.school.clone())
            .increment(events.len() as u64);
        info!("✅ {}: {} events", source.school, events.len());

        (report, events)
    }
}

/// Chronological order with undated events last; ties broken by school.
/// Stable, so equal keys keep their collection order.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| {
        let by_start = match (&a.start, &b.start) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_start.then_with(|| a.school.cmp(&b.school))
    });
}

/// Keep the first event of every `(title, start)` pair
pub fn dedupe_events(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|e| seen.insert((e.title.clone(), e.start)))
        .collect()
}
