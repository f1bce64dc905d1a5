use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;
use crate::slug::fallback_iconify_id;

const SEARCH_LIMIT: &str = "3";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search returned status {0}")]
    Status(u16),
    #[error("malformed search response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    icons: Vec<String>,
    #[serde(default)]
    total: u64,
}

/// Resolves canonical icon identifiers (`prefix:name`) via the icon search API.
pub struct IconResolver {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    enabled: bool,
}

impl IconResolver {
    pub fn new(http: reqwest::Client, settings: &Settings) -> Self {
        Self {
            http,
            base_url: settings.iconify_url.trim_end_matches('/').to_string(),
            timeout: settings.search_timeout(),
            enabled: settings.verify_icons,
        }
    }

    /// Try `"<provider> <title>"`, then `title`, then `slug`; first hit wins.
    /// Falls back to `logos:<provider>-<title>` when nothing matches.
    pub async fn resolve(&self, provider: &str, title: &str, slug: &str) -> String {
        if self.enabled {
            let queries = [format!("{} {}", provider, title), title.to_string(), slug.to_string()];
            for query in &queries {
                match self.search(query).await {
                    Ok(Some(id)) => return id,
                    Ok(None) => debug!(query = %query, "No icon match"),
                    Err(e) => debug!(query = %query, error = %e, "Icon search failed"),
                }
            }
        }
        fallback_iconify_id(provider, title)
    }

    async fn search(&self, query: &str) -> Result<Option<String>, SearchError> {
        let resp = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("query", query), ("limit", SEARCH_LIMIT)])
            .timeout(self.timeout)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SearchError::Status(resp.status().as_u16()));
        }
        let body = resp.bytes().await?;
        let parsed: SearchResponse = serde_json::from_slice(&body)?;
        if parsed.total > 0 {
            Ok(parsed.icons.into_iter().next())
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(base_url: &str) -> IconResolver {
        let settings = Settings {
            iconify_url: base_url.to_string(),
            ..Settings::default()
        };
        IconResolver::new(reqwest::Client::new(), &settings)
    }

    fn hits(icons: &[&str]) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "icons": icons, "total": icons.len() }))
    }

    #[tokio::test]
    async fn first_query_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "AWS ec2"))
            .and(query_param("limit", "3"))
            .respond_with(hits(&["logos:aws-ec2", "mdi:server"]))
            .expect(1)
            .mount(&server)
            .await;

        let id = resolver(&server.uri()).resolve("AWS", "ec2", "aws-ec2").await;
        assert_eq!(id, "logos:aws-ec2");
    }

    #[tokio::test]
    async fn falls_through_to_slug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "AWS cloud map"))
            .respond_with(hits(&[]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "cloud map"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("query", "aws-cloud-map"))
            .respond_with(hits(&["carbon:map"]))
            .mount(&server)
            .await;

        let id = resolver(&server.uri()).resolve("AWS", "cloud map", "aws-cloud-map").await;
        assert_eq!(id, "carbon:map");
    }

    #[tokio::test]
    async fn zero_total_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "icons": ["x:y"], "total": 0 })),
            )
            .expect(3)
            .mount(&server)
            .await;

        let id = resolver(&server.uri()).resolve("INFRA", "access denied", "infra-access-denied").await;
        assert_eq!(id, "logos:infra-access-denied");
    }

    #[tokio::test]
    async fn garbage_then_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let id = resolver(&server.uri()).resolve("GCP", "Cloud SQL", "gcp-cloud-sql").await;
        assert_eq!(id, "logos:gcp-cloud-sql");
    }

    #[tokio::test]
    async fn disabled_skips_network() {
        let settings = Settings {
            iconify_url: "http://127.0.0.1:9".to_string(),
            verify_icons: false,
            ..Settings::default()
        };
        let r = IconResolver::new(reqwest::Client::new(), &settings);
        assert_eq!(r.resolve("AWS", "ec2_instance", "aws-ec2-instance").await, "logos:aws-ec2-instance");
    }
}
