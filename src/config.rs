use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "ICONS";

/// Run configuration. Defaults reproduce the stock behavior; environment
/// variables (`ICONS_*`) and CLI flags override individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source_url: String,
    pub output_dir: PathBuf,
    pub rag_file: String,

    pub use_llm: bool,
    pub llm_base_url: String,
    pub batch_mode: bool,
    pub batch_size: usize,

    /// Per-category cap for quick test runs.
    pub test_limit: Option<usize>,

    pub verify_icons: bool,
    pub iconify_url: String,

    pub fetch_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub classify_timeout_secs: u64,
    pub batch_timeout_secs: u64,
    pub search_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: "https://icons.terrastruct.com".into(),
            output_dir: PathBuf::from("output"),
            rag_file: "icons_rag.json".into(),
            use_llm: false,
            llm_base_url: "http://localhost:5000".into(),
            batch_mode: true,
            batch_size: 5,
            test_limit: None,
            verify_icons: true,
            iconify_url: "https://api.iconify.design".into(),
            fetch_timeout_secs: 10,
            health_timeout_secs: 3,
            classify_timeout_secs: 30,
            batch_timeout_secs: 300,
            search_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Defaults layered with `ICONS_*` environment variables.
    pub fn load() -> Result<Self> {
        let settings: Settings = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.test_limit == Some(0) {
            bail!("test_limit must be at least 1 when set");
        }
        Ok(())
    }

    pub fn rag_path(&self) -> PathBuf {
        self.output_dir.join(&self.rag_file)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}
