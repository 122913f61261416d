//! Prometheus recorder for the run counters emitted by the pipeline.
//!
//! No HTTP listener is started: a run is a short batch job, so the snapshot is
//! rendered in-process and written next to the exports.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Once, OnceLock};
use tracing::{info, warn};

pub const METRICS_FILE: &str = "metrics.prom";

static INIT: Once = Once::new();
static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the global recorder. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        match builder.install_recorder() {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("Metrics handle was already set");
                }
                info!("📈 Prometheus recorder installed");
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    });
}

/// Text exposition of everything recorded so far, if a recorder is installed
pub fn render_metrics() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

/// Write the current snapshot to `<dir>/metrics.prom`. Returns `None` when
/// no recorder is installed.
pub fn write_snapshot(dir: &Path) -> Result<Option<PathBuf>> {
    let Some(text) = render_metrics() else {
        return Ok(None);
    };
    fs::create_dir_all(dir)?;
    let path = dir.join(METRICS_FILE);
    fs::write(&path, text)?;
    info!("📈 Wrote metrics snapshot to {}", path.display());
    Ok(Some(path))
}
