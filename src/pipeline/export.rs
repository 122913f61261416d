use crate::coerce::format_iso;
use crate::error::Result;
use crate::types::Event;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CSV_FILE: &str = "events.csv";
pub const JSON_FILE: &str = "events.json";
pub const HTML_FILE: &str = "index.html";

pub const CSV_COLUMNS: [&str; 10] = [
    "school",
    "title",
    "start",
    "end",
    "url",
    "location",
    "city",
    "isOnline",
    "description",
    "imageUrl",
];

const HTML_TEMPLATE: &str = include_str!("assets/index.html");
const DATA_PLACEHOLDER: &str = "__EVENTS_JSON__";

/// Files produced by one export
#[derive(Debug, Clone, Default)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub html: Option<PathBuf>,
}

pub fn write_csv<W: Write>(events: &[Event], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_COLUMNS)?;
    for e in events {
        let start = e.start.as_ref().map(format_iso).unwrap_or_default();
        let end = e.end.as_ref().map(format_iso).unwrap_or_default();
        writer.write_record([
            e.school.as_str(),
            e.title.as_str(),
            start.as_str(),
            end.as_str(),
            e.url.as_deref().unwrap_or_default(),
            e.location.as_str(),
            e.city.as_deref().unwrap_or_default(),
            if e.is_online { "true" } else { "false" },
            e.description.as_deref().unwrap_or_default(),
            e.image_url.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(events: &[Event], out: W) -> Result<()> {
    serde_json::to_writer_pretty(out, events)?;
    Ok(())
}

/// Static page with the events embedded as a JS array literal
pub fn render_html(events: &[Event]) -> Result<String> {
    // `</` would let a title close the surrounding script element
    let data = serde_json::to_string(events)?.replace("</", "<\\/");
    Ok(HTML_TEMPLATE.replace(DATA_PLACEHOLDER, &data))
}

/// Write every export format into `dir`, creating it if needed
pub fn write_all(events: &[Event], dir: &Path, with_html: bool) -> Result<ExportPaths> {
    fs::create_dir_all(dir)?;
    let paths = ExportPaths {
        csv: dir.join(CSV_FILE),
        json: dir.join(JSON_FILE),
        html: with_html.then(|| dir.join(HTML_FILE)),
    };

    write_csv(events, fs::File::create(&paths.csv)?)?;
    write_json(events, fs::File::create(&paths.json)?)?;
    if let Some(html_path) = &paths.html {
        fs::write(html_path, render_html(events)?)?;
    }

    info!("💾 Exported {} events to {}", events.len(), dir.display());
    Ok(paths)
}
