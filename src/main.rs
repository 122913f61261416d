use alumni_agenda::config::Config;
use alumni_agenda::constants::get_supported_kinds;
use alumni_agenda::infra::ReqwestHttp;
use alumni_agenda::logging;
use alumni_agenda::metrics;
use alumni_agenda::pipeline::{export, Pipeline, SourceStatus};
use alumni_agenda::types::SourceKind;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "alumni_agenda")]
#[command(about = "Aggregates upcoming alumni association events into one feed")]
#[command(version)]
struct Cli {
    /// Debug-level logs for this crate (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured source and export the merged feed
    Run {
        /// TOML configuration file; built-in sources are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory (overrides config and ALUMNI_OUTPUT_DIR)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only run these schools (comma-separated, case-insensitive)
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
        /// Drop events sharing title and start time
        #[arg(long)]
        dedupe: bool,
        /// Skip the static HTML page
        #[arg(long)]
        no_html: bool,
    },
    /// List configured sources and their family tags
    Sources {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            output,
            sources,
            dedupe,
            no_html,
        } => {
            let mut config = Config::resolve(config.as_deref()).context("Failed to load configuration")?;
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            config.retain_sources(&sources);
            config.dedupe |= dedupe;
            if no_html {
                config.write_html = false;
            }
            if config.sources.is_empty() {
                warn!("No sources selected");
            }

            metrics::init_metrics();
            println!("🔎 Fetching events from {} sources...", config.sources.len());
            let http = ReqwestHttp::new(Duration::from_secs(config.request_timeout_secs))
                .context("Failed to build HTTP client")?;
            let result = Pipeline::new(Arc::new(http)).run(&config).await;

            println!("\n📊 Sources:");
            for report in &result.reports {
                let icon = match report.status {
                    SourceStatus::Ok => "✅",
                    SourceStatus::Failed(_) => "❌",
                    SourceStatus::Skipped(_) => "⚠️ ",
                };
                println!(
                    "   {} {} [{}]: {} raw, {} events ({})",
                    icon, report.school, report.kind, report.raw_count, report.event_count, report.status
                );
            }

            let paths = export::write_all(&result.events, &config.output_dir, config.write_html)
                .with_context(|| format!("Failed to write output to {}", config.output_dir.display()))?;
            info!(
                "Run complete: {} events, {} failed sources",
                result.events.len(),
                result.failed_sources()
            );

            println!("\n💾 Exported {} events:", result.events.len());
            println!("   - {}", paths.csv.display());
            println!("   - {}", paths.json.display());
            if let Some(html) = &paths.html {
                println!("   - {}", html.display());
            }
            match metrics::write_snapshot(&config.output_dir) {
                Ok(Some(path)) => println!("   - {}", path.display()),
                Ok(None) => {}
                Err(e) => warn!("Could not write metrics snapshot: {}", e),
            }
        }
        Commands::Sources { config } => {
            let config = Config::resolve(config.as_deref()).context("Failed to load configuration")?;
            for source in &config.sources {
                let known = if SourceKind::from_tag(&source.kind).is_some() { "" } else { " (unknown family)" };
                println!("{:<28} {:<12}{} {}", source.school, source.kind, known, source.url);
            }
            println!("\nSupported families: {}", get_supported_kinds().join(", "));
        }
    }

    Ok(())
}
