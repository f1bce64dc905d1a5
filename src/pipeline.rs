use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::collect::{self, PendingIcon};
use crate::config::Settings;
use crate::enrich::{Enrichment, EnrichmentClient};
use crate::heuristics::Heuristics;
use crate::iconify::IconResolver;
use crate::output;
use crate::payload::{Assembler, IconRecord};
use crate::providers::ProviderTable;

pub const ERRORS_FILE: &str = "enrichment_errors.json";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Counts reported after a run.
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub collected: usize,
    pub categories: usize,
    pub enriched: usize,
    pub unavailable: usize,
    pub failed: usize,
    pub providers: usize,
    pub records: usize,
}

impl RunSummary {
    pub fn print(&self) {
        println!(
            "Collected {} icons from {} categories.",
            self.collected, self.categories
        );
        println!(
            "Enrichment: {} enriched, {} unavailable, {} failed.",
            self.enriched, self.unavailable, self.failed
        );
        println!("Wrote {} records across {} providers.", self.records, self.providers);
    }
}

#[derive(Serialize)]
struct EnrichmentFailure<'a> {
    slug: &'a str,
    provider: &'a str,
    display_name: &'a str,
    error: String,
}

/// Scrape, enrich, assemble, and write every output file.
pub async fn run(settings: &Settings) -> Result<RunSummary> {
    if let Some(limit) = settings.test_limit {
        info!("Test mode: {} icons per category", limit);
    }

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    output::create_dir(&settings.output_dir)?;

    let collection = collect::collect_icons(
        &http,
        &settings.source_url,
        settings.fetch_timeout(),
        settings.test_limit,
    )
    .await?;

    let enricher = EnrichmentClient::new(http.clone(), settings);
    let enrichments = enrich_all(&enricher, &collection.pending, settings).await;

    let resolver = IconResolver::new(http, settings);
    let assembler = Assembler::new(
        &settings.source_url,
        ProviderTable::default(),
        Heuristics::default(),
    );
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut summary = RunSummary {
        collected: collection.pending.len(),
        categories: collection.categories.len(),
        ..RunSummary::default()
    };
    let mut records = Vec::with_capacity(collection.pending.len());
    let mut failures = Vec::new();

    let pb = progress_bar(collection.pending.len())?;
    for (icon, enrichment) in collection.pending.iter().zip(&enrichments) {
        match enrichment {
            Enrichment::Enriched(_) => summary.enriched += 1,
            Enrichment::Unavailable => summary.unavailable += 1,
            Enrichment::Failed(_) => summary.failed += 1,
        }

        let slug = assembler.slug(icon);
        let iconify_id = resolver.resolve(&icon.category, &icon.title, &slug).await;
        let record = assembler.build(icon, &enrichment.result(), iconify_id, &timestamp);

        if let Some(e) = enrichment.error() {
            failures.push((records.len(), e.to_string()));
        }
        records.push(record);
        pb.inc(1);
    }
    pb.finish_and_clear();
    info!("Enrichment complete: {} icons processed", records.len());

    output::create_category_dirs(&settings.output_dir, &collection.categories)?;

    let groups = output::group_by_provider(&records);
    output::write_provider_files(&settings.output_dir, &groups, assembler.providers())?;
    summary.providers = groups.len();

    let rag_path = settings.rag_path();
    output::write_json(&rag_path, &records)
        .with_context(|| format!("Failed to write RAG JSON {}", rag_path.display()))?;
    info!("RAG JSON: {} ({} icons)", rag_path.display(), records.len());

    if !failures.is_empty() {
        write_failures(settings, &records, failures)?;
    }

    summary.records = records.len();
    info!(?summary, "Generation complete");
    Ok(summary)
}

/// One outcome per pending icon, in input order.
async fn enrich_all(
    enricher: &EnrichmentClient,
    pending: &[PendingIcon],
    settings: &Settings,
) -> Vec<Enrichment> {
    let unavailable = || -> Vec<Enrichment> { pending.iter().map(|_| Enrichment::Unavailable).collect() };

    if !settings.use_llm {
        return unavailable();
    }
    if !enricher.health().await {
        warn!("Classification service unavailable, using fallback enrichment");
        return unavailable();
    }
    info!("Classification service connected");

    let mut out = Vec::with_capacity(pending.len());
    if settings.batch_mode {
        info!("Batch processing {} icons...", pending.len());
        let mut start = 0;
        for chunk in pending.chunks(settings.batch_size) {
            out.extend(enricher.classify_batch(chunk).await);
            start += chunk.len();
            info!("Processed batch {}-{} of {}", start - chunk.len() + 1, start, pending.len());
        }
    } else {
        info!("Processing {} icons individually...", pending.len());
        for icon in pending {
            out.push(enricher.classify(icon).await);
        }
    }
    out
}

fn write_failures(
    settings: &Settings,
    records: &[IconRecord],
    failures: Vec<(usize, String)>,
) -> Result<()> {
    let report: Vec<EnrichmentFailure> = failures
        .into_iter()
        .map(|(idx, error)| EnrichmentFailure {
            slug: &records[idx].slug,
            provider: &records[idx].provider,
            display_name: &records[idx].display_name,
            error,
        })
        .collect();
    let path = settings.output_dir.join(ERRORS_FILE);
    output::write_json(&path, &report)?;
    warn!("{} icons failed enrichment, see {}", report.len(), path.display());
    Ok(())
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );
    Ok(pb)
}
