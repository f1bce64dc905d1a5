use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::collect::PendingIcon;
use crate::config::Settings;

/// Semantic attributes returned by the classification service. Missing
/// fields decode to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentResult {
    pub category: String,
    pub aliases: Vec<String>,
    pub technical_intent: String,
    pub semantic_profile: String,
    pub tags: Vec<String>,
    pub shape_type: String,
    pub is_container: bool,
    pub brand_color: String,
}

#[derive(Debug, Clone, Error)]
pub enum EnrichError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("service error: {0}")]
    ItemError(String),
    #[error("no result returned for this icon")]
    MissingResult,
}

impl From<reqwest::Error> for EnrichError {
    fn from(e: reqwest::Error) -> Self {
        EnrichError::Transport(e.to_string())
    }
}

/// Which path produced an icon's enrichment.
#[derive(Debug)]
pub enum Enrichment {
    Enriched(EnrichmentResult),
    /// Enrichment disabled, or the service failed its health check.
    Unavailable,
    Failed(EnrichError),
}

impl Enrichment {
    /// The attributes to build a record from; zero values unless enriched.
    pub fn result(&self) -> EnrichmentResult {
        match self {
            Enrichment::Enriched(result) => result.clone(),
            Enrichment::Unavailable | Enrichment::Failed(_) => EnrichmentResult::default(),
        }
    }

    pub fn error(&self) -> Option<&EnrichError> {
        match self {
            Enrichment::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    provider: &'a str,
    title: &'a str,
    display_name: &'a str,
}

impl<'a> From<&'a PendingIcon> for ClassifyRequest<'a> {
    fn from(icon: &'a PendingIcon) -> Self {
        Self {
            provider: &icon.category,
            title: &icon.title,
            display_name: &icon.display_name,
        }
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    icons: Vec<ClassifyRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchResponse {
    /// Entries are either a result object or `{"error": "..."}`.
    results: Vec<serde_json::Value>,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    processing_time_ms: f64,
}

/// HTTP client for the classification service (`/health`, `/classify`, `/batch`).
pub struct EnrichmentClient {
    http: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
    classify_timeout: Duration,
    batch_timeout: Duration,
}

impl EnrichmentClient {
    pub fn new(http: reqwest::Client, settings: &Settings) -> Self {
        Self {
            http,
            base_url: settings.llm_base_url.trim_end_matches('/').to_string(),
            health_timeout: settings.health_timeout(),
            classify_timeout: settings.classify_timeout(),
            batch_timeout: settings.batch_timeout(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// True only for a 200 from `GET /health` within the health timeout.
    pub async fn health(&self) -> bool {
        let response = self
            .http
            .get(self.url("health"))
            .timeout(self.health_timeout)
            .send()
            .await;
        match response {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => true,
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "Classification service unhealthy");
                false
            }
            Err(e) => {
                warn!(error = %e, "Classification service unreachable");
                false
            }
        }
    }

    /// Classify one icon. Never errors: failures come back as `Enrichment::Failed`.
    pub async fn classify(&self, icon: &PendingIcon) -> Enrichment {
        match self.try_classify(icon).await {
            Ok(result) => Enrichment::Enriched(result),
            Err(e) => {
                warn!(title = %icon.title, error = %e, "Enrichment failed");
                Enrichment::Failed(e)
            }
        }
    }

    async fn try_classify(&self, icon: &PendingIcon) -> Result<EnrichmentResult, EnrichError> {
        let body = self
            .post_json("classify", &ClassifyRequest::from(icon), self.classify_timeout)
            .await?;
        parse_item(serde_json::from_slice(&body).map_err(|e| EnrichError::Decode(e.to_string()))?)
    }

    /// Classify a chunk in one request. The output has exactly one entry per
    /// input icon, in input order.
    pub async fn classify_batch(&self, icons: &[PendingIcon]) -> Vec<Enrichment> {
        let response = match self.try_batch(icons).await {
            Ok(response) => response,
            Err(e) => {
                warn!(size = icons.len(), error = %e, "Batch enrichment failed");
                return icons.iter().map(|_| Enrichment::Failed(e.clone())).collect();
            }
        };

        debug!(
            total = response.total,
            processing_time_ms = response.processing_time_ms,
            "Batch classified"
        );

        let mut results = response.results.into_iter();
        icons
            .iter()
            .map(|icon| {
                let outcome = match results.next() {
                    Some(value) => parse_item(value),
                    None => Err(EnrichError::MissingResult),
                };
                match outcome {
                    Ok(result) => Enrichment::Enriched(result),
                    Err(e) => {
                        warn!(title = %icon.title, error = %e, "Batch item failed");
                        Enrichment::Failed(e)
                    }
                }
            })
            .collect()
    }

    async fn try_batch(&self, icons: &[PendingIcon]) -> Result<BatchResponse, EnrichError> {
        let request = BatchRequest {
            icons: icons.iter().map(ClassifyRequest::from).collect(),
        };
        let body = self.post_json("batch", &request, self.batch_timeout).await?;
        serde_json::from_slice(&body).map_err(|e| EnrichError::Decode(e.to_string()))
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
        timeout: Duration,
    ) -> Result<Vec<u8>, EnrichError> {
        let resp = self
            .http
            .post(self.url(path))
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(EnrichError::Status(resp.status().as_u16()));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

fn parse_item(value: serde_json::Value) -> Result<EnrichmentResult, EnrichError> {
    if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
        return Err(EnrichError::ItemError(message.to_string()));
    }
    serde_json::from_value(value).map_err(|e| EnrichError::Decode(e.to_string()))
}
