use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collect::PendingIcon;
use crate::enrich::EnrichmentResult;
use crate::heuristics::Heuristics;
use crate::providers::ProviderTable;
use crate::slug::{array_to_json, generate_slug};

pub const POSITION_CENTER: &str = "center";
pub const POSITION_TOP_LEFT: &str = "top-left";

/// One icon as written to the provider files and the RAG file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconRecord {
    pub id: String,
    pub slug: String,
    pub iconify_id: String,
    pub provider: String,
    pub url: String,
    pub semantic_profile: String,
    pub display_name: String,
    /// JSON-encoded string array.
    pub aliases: String,
    pub description: String,
    pub technical_intent: String,
    pub shape_type: String,
    pub default_width: u32,
    pub is_container: bool,
    pub icon_position: String,
    pub color_theme: String,
    pub popularity: f32,
    /// JSON-encoded string array.
    pub tags: String,
    pub last_scraped: String,
}

/// Everything record assembly needs besides the icon itself.
#[derive(Debug, Clone)]
pub struct Assembler {
    source_url: String,
    providers: ProviderTable,
    heuristics: Heuristics,
}

impl Assembler {
    pub fn new(source_url: &str, providers: ProviderTable, heuristics: Heuristics) -> Self {
        Self {
            source_url: source_url.trim_end_matches('/').to_string(),
            providers,
            heuristics,
        }
    }

    pub fn providers(&self) -> &ProviderTable {
        &self.providers
    }

    pub fn slug(&self, icon: &PendingIcon) -> String {
        generate_slug(&icon.category, &icon.title)
    }

    /// Merge scraped fields, enrichment and heuristics into a record.
    /// Only `id` varies between calls with the same inputs.
    pub fn build(
        &self,
        icon: &PendingIcon,
        enrichment: &EnrichmentResult,
        iconify_id: String,
        timestamp: &str,
    ) -> IconRecord {
        let icon_position = if enrichment.is_container {
            POSITION_TOP_LEFT
        } else {
            POSITION_CENTER
        };

        IconRecord {
            id: Uuid::new_v4().to_string(),
            slug: self.slug(icon),
            iconify_id,
            provider: self.providers.full_name(&icon.category),
            url: format!("{}/{}", self.source_url, icon.link),
            semantic_profile: enrichment.semantic_profile.clone(),
            display_name: icon.display_name.clone(),
            aliases: array_to_json(&enrichment.aliases),
            description: format!(
                "{} from {}. {}",
                icon.display_name, icon.category, enrichment.technical_intent
            ),
            technical_intent: enrichment.technical_intent.clone(),
            shape_type: enrichment.shape_type.clone(),
            default_width: self.heuristics.default_width(&enrichment.category),
            is_container: enrichment.is_container,
            icon_position: icon_position.to_string(),
            color_theme: enrichment.brand_color.clone(),
            popularity: self.heuristics.popularity(&icon.title),
            tags: array_to_json(&enrichment.tags),
            last_scraped: timestamp.to_string(),
        }
    }
}
