use crate::constants::*;
use crate::error::{Result, ScraperError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `output_dir`
pub const OUTPUT_DIR_ENV: &str = "ALUMNI_OUTPUT_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub page_delay_ms: u64,
    /// Drop later events sharing `(title, start)` with an earlier one
    pub dedupe: bool,
    pub write_html: bool,
    /// Persist the first raw page of page-numbered sources under `<output_dir>/debug`
    pub write_debug: bool,
    pub sources: Vec<SourceConfig>,
}

/// One configured organization and the backend family that serves it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub school: String,
    pub base: String,
    pub url: String,
    /// Source family tag, e.g. `api_v2_hal`
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<AgendaSelectors>,
}

/// CSS selectors for scraping agenda pages. Each entry may list comma-separated
/// alternatives; the first one yielding non-empty text wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaSelectors {
    pub card: String,
    pub title: String,
    pub date: String,
    pub location: Option<String>,
    pub link: String,
    pub next: Option<String>,
}

impl Default for AgendaSelectors {
    fn default() -> Self {
        Self {
            card: ".event, .event-card, .agenda-item".to_string(),
            title: ".event-title, .event-card__title, h3, h2".to_string(),
            date: ".event-date, .event-card__date, time".to_string(),
            location: Some(".event-location, .event-card__location, .location".to_string()),
            link: "a".to_string(),
            next: Some("a[rel='next'], a.pagination-next, a[aria-label='Next']".to_string()),
        }
    }
}

impl SourceConfig {
    pub fn new(school: &str, base: &str, url: &str, kind: &str) -> Self {
        Self {
            school: school.to_string(),
            base: base.to_string(),
            url: url.to_string(),
            kind: kind.to_string(),
            lookback_days: None,
            page_size: None,
            max_pages: None,
            selectors: None,
        }
    }

    pub fn lookback_days(&self) -> i64 {
        self.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn max_pages(&self, default: usize) -> usize {
        self.max_pages.filter(|n| *n > 0).unwrap_or(default)
    }

    pub fn selectors(&self) -> AgendaSelectors {
        self.selectors.clone().unwrap_or_default()
    }
}

fn agenda_api_url(base: &str, limit: u32, with_streamer: bool) -> String {
    let streamer = if with_streamer { "&properties[1]=streamer" } else { "" };
    format!(
        "{base}/api/v2/public/agenda/occurrence/visitor/occurrence?language=auto&published=1&order[begin_at]=asc&when=upcoming&properties[0]=group{streamer}&limit={limit}"
    )
}

/// The built-in source list
pub fn default_sources() -> Vec<SourceConfig> {
    let hal = |school: &str, base: &str, limit: u32, streamer: bool| {
        SourceConfig::new(school, base, &agenda_api_url(base, limit, streamer), HAL_API_KIND)
    };
    vec![
        hal("ESSEC Alumni", "https://www.essecalumni.com", 50, false),
        hal("HEC Alumni", "https://www.hecalumni.fr", 12, false),
        hal("Mines Paris Alumni", "https://mines-paris.org", 50, true),
        SourceConfig::new(
            "Arts et Métiers Alumni",
            "https://www.arts-et-metiers.asso.fr",
            "https://www.arts-et-metiers.asso.fr/events.json",
            PAGED_JSON_KIND,
        ),
        hal("AX Polytechnique Alumni", "https://ax.polytechnique.org", 50, false),
        hal("Dauphine Alumni", "https://www.dauphine-alumni.org", 50, false),
        hal(
            "CentraleSupélec Alumni",
            "https://association.centralesupelec-alumni.com",
            50,
            true,
        ),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            dedupe: false,
            write_html: true,
            write_debug: true,
            sources: default_sources(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` when given, else the built-in defaults; then apply
    /// environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.output_dir = PathBuf::from(dir);
            }
        }
        Ok(config)
    }

    pub fn debug_dir(&self) -> Option<PathBuf> {
        self.write_debug.then(|| self.output_dir.join("debug"))
    }

    /// Keep only the sources whose school matches one of `names` (case-insensitive)
    pub fn retain_sources(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        let wanted: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        self.sources
            .retain(|s| wanted.iter().any(|w| *w == s.school.to_lowercase()));
    }
}
