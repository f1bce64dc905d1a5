use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::slug::{clean_display_name, unescape_unicode};

const ICON_SELECTOR: &str = r#"div[class="icon"]"#;
const CLICK_PREFIX: &str = "clickIcon(\"";
const CLICK_SUFFIX: &str = "\")";

/// An icon found on the source page, waiting for enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingIcon {
    /// Provider code, e.g. `AWS`.
    pub category: String,
    pub title: String,
    /// Path relative to the source root, still percent-encoded.
    pub link: String,
    pub display_name: String,
}

#[derive(Debug, Default)]
pub struct Collection {
    pub pending: Vec<PendingIcon>,
    /// Every provider code seen, used to pre-create output directories.
    pub categories: BTreeSet<String>,
}

/// Fetch the source page and extract its icons. Any fetch failure,
/// including a timeout, is fatal.
pub async fn collect_icons(
    client: &reqwest::Client,
    source_url: &str,
    timeout: Duration,
    limit: Option<usize>,
) -> Result<Collection> {
    info!("Fetching icon page: {}", source_url);
    let html = client
        .get(source_url)
        .timeout(timeout)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", source_url))?
        .error_for_status()
        .with_context(|| format!("Bad response from {}", source_url))?
        .text()
        .await
        .context("Failed to read icon page body")?;

    let collection = parse_icons(&html, limit)?;
    info!(
        "Collected {} icons from {} categories",
        collection.pending.len(),
        collection.categories.len()
    );
    Ok(collection)
}

/// Walk `div.icon` elements. Entries whose `onclick` link has no `%`
/// separator are skipped without notice.
pub fn parse_icons(html: &str, limit: Option<usize>) -> Result<Collection> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(ICON_SELECTOR)
        .map_err(|e| anyhow::anyhow!("Invalid selector {}: {}", ICON_SELECTOR, e))?;

    let mut collection = Collection::default();
    let mut per_category: HashMap<String, usize> = HashMap::new();

    for element in document.select(&selector) {
        let onclick = element.value().attr("onclick").unwrap_or_default();
        let Some(link) = extract_link(onclick) else {
            continue;
        };
        let Some((code, _)) = link.split_once('%') else {
            continue;
        };
        let category = code.to_uppercase();

        let count = per_category.entry(category.clone()).or_insert(0);
        if limit.is_some_and(|max| *count >= max) {
            debug!(category = %category, "Test limit reached, skipping");
            continue;
        }
        *count += 1;

        let title = element.value().attr("data-search").unwrap_or_default().to_string();
        collection.categories.insert(category.clone());
        collection.pending.push(PendingIcon {
            display_name: clean_display_name(&title),
            category,
            title,
            link,
        });
    }

    Ok(collection)
}

/// `clickIcon("aws%2Fec2.svg")` → `aws%2Fec2.svg`. Returns `None` for
/// anything that is not a `%`-delimited link.
fn extract_link(onclick: &str) -> Option<String> {
    let unescaped = unescape_unicode(onclick);
    let inner = unescaped.strip_prefix(CLICK_PREFIX).unwrap_or(&unescaped);
    let link = inner.strip_suffix(CLICK_SUFFIX).unwrap_or(inner);
    if link.is_empty() || !link.contains('%') {
        return None;
    }
    Some(link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/icons.html").unwrap()
    }

    #[test]
    fn link_extraction() {
        assert_eq!(extract_link(r#"clickIcon("aws%2Fec2.svg")"#).as_deref(), Some("aws%2Fec2.svg"));
        assert_eq!(
            extract_link(r#"clickIcon("gcp%2Fsql.svg")"#).as_deref(),
            Some("gcp%2Fsql.svg")
        );
        assert_eq!(extract_link(r#"clickIcon("no-separator.svg")"#), None);
        assert_eq!(extract_link(""), None);
    }

    #[test]
    fn parses_fixture() {
        let c = parse_icons(&fixture(), None).unwrap();
        assert_eq!(c.pending.len(), 6);
        let codes: Vec<&str> = c.categories.iter().map(String::as_str).collect();
        assert_eq!(codes, vec!["AWS", "ESSENTIALS", "GCP", "INFRA"]);

        let first = &c.pending[0];
        assert_eq!(first.category, "AWS");
        assert_eq!(first.title, "ec2_instance");
        assert_eq!(first.link, "aws%2FCompute%2Fec2_instance.svg");
        assert_eq!(first.display_name, "Ec2 Instance");
    }

    #[test]
    fn skips_malformed_and_non_icon_divs() {
        let c = parse_icons(&fixture(), None).unwrap();
        assert!(c.pending.iter().all(|p| p.link.contains('%')));
        assert!(!c.pending.iter().any(|p| p.title == "broken"));
        assert!(!c.pending.iter().any(|p| p.title == "not-an-icon"));
    }

    #[test]
    fn per_category_limit() {
        let c = parse_icons(&fixture(), Some(1)).unwrap();
        assert_eq!(c.pending.len(), 4);
        assert_eq!(c.pending.iter().filter(|p| p.category == "AWS").count(), 1);
    }

    #[test]
    fn empty_page() {
        let c = parse_icons("<html><body></body></html>", None).unwrap();
        assert!(c.pending.is_empty());
        assert!(c.categories.is_empty());
    }
}
