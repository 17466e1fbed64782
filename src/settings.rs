use std::path::PathBuf;

use anyhow::{Context, Result};
use config::Config;
use serde::Deserialize;

/// Runtime settings: defaults, then `AWESOME_*` environment variables, then
/// the conventional credential variables. CLI flags are applied on top by
/// `main`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub urls_path: PathBuf,
    pub categories_path: PathBuf,
    pub blacklist_path: PathBuf,
    pub history_dir: PathBuf,
    pub readme_path: PathBuf,
    pub github_api: String,
    pub github_token: Option<String>,
    pub github_repository: Option<String>,
    pub openrouter_api: String,
    pub openrouter_api_key: Option<String>,
    pub model: String,
    pub classify_delay_ms: u64,
    pub hall_of_fame_months: u32,
    pub artefacts_months: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            urls_path: PathBuf::from("urls.json"),
            categories_path: PathBuf::from("categories.json"),
            blacklist_path: PathBuf::from("blacklist.txt"),
            history_dir: PathBuf::from("history"),
            readme_path: PathBuf::from("README.md"),
            github_api: "https://api.github.com".to_string(),
            github_token: None,
            github_repository: None,
            openrouter_api: "https://openrouter.ai/api/v1".to_string(),
            openrouter_api_key: None,
            model: "google/gemini-3-flash-preview".to_string(),
            classify_delay_ms: 100,
            hall_of_fame_months: 6,
            artefacts_months: 12,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(config::Environment::with_prefix("AWESOME").try_parsing(true))
            .set_override_option("github_token", non_empty_env("GITHUB_TOKEN"))?
            .set_override_option("github_repository", non_empty_env("GITHUB_REPOSITORY"))?
            .set_override_option("openrouter_api_key", non_empty_env("OPENROUTER_API_KEY"))?
            .build()
            .context("building settings")?
            .try_deserialize()
            .context("reading settings")?;
        Ok(settings)
    }

    pub fn require_github_repository(&self) -> Result<&str> {
        self.github_repository
            .as_deref()
            .context("GITHUB_REPOSITORY environment variable must be set")
    }

    pub fn require_openrouter_key(&self) -> Result<&str> {
        self.openrouter_api_key
            .as_deref()
            .context("OPENROUTER_API_KEY not set in environment")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
