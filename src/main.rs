mod collect;
mod config;
mod enrich;
mod heuristics;
mod iconify;
mod output;
mod payload;
mod pipeline;
mod providers;
mod slug;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use crate::config::Settings;

/// Scrape icon metadata, optionally enrich it, and write RAG-ready JSON.
///
/// Every flag overrides the matching `ICONS_*` environment variable.
#[derive(Parser)]
#[command(name = "icon_scraper", about = "Icon metadata scraper for diagram generation and RAG")]
struct Cli {
    /// Page listing the icons
    #[arg(long)]
    source_url: Option<String>,
    /// Directory for provider files and the RAG file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Enrich icons via the classification service
    #[arg(long)]
    llm: bool,
    /// Classification service base URL
    #[arg(long)]
    llm_url: Option<String>,
    /// One request per icon instead of batches
    #[arg(long)]
    individual: bool,
    /// Icons per batch request
    #[arg(short, long)]
    batch_size: Option<usize>,
    /// Max icons per category (test runs)
    #[arg(short = 'n', long)]
    limit: Option<usize>,
    /// Skip the icon search service and use synthesized identifiers
    #[arg(long)]
    no_verify: bool,
    /// Icon search service base URL
    #[arg(long)]
    iconify_url: Option<String>,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(url) = self.source_url {
            settings.source_url = url;
        }
        if let Some(dir) = self.output_dir {
            settings.output_dir = dir;
        }
        if self.llm {
            settings.use_llm = true;
        }
        if let Some(url) = self.llm_url {
            settings.llm_base_url = url;
        }
        if self.individual {
            settings.batch_mode = false;
        }
        if let Some(size) = self.batch_size {
            settings.batch_size = size;
        }
        if self.limit.is_some() {
            settings.test_limit = self.limit;
        }
        if self.no_verify {
            settings.verify_icons = false;
        }
        if let Some(url) = self.iconify_url {
            settings.iconify_url = url;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load()?;
    cli.apply(&mut settings);
    settings.validate()?;

    let summary = pipeline::run(&settings).await?;
    summary.print();

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
