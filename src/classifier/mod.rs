//! Incremental categorization of urls.json into categories.json.

pub mod prompt;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, OTHER};
use crate::github::GithubApi;
use crate::llm::{Completer, LlmError};
use crate::model::{Entry, Membership, RepoMeta};
use crate::store::CategoryStore;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("response is not a JSON array: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct Classifier<'a> {
    github: &'a dyn GithubApi,
    completer: &'a dyn Completer,
    catalog: &'a Catalog,
    system_prompt: String,
    delay: Duration,
}

#[derive(Debug, Default, PartialEq)]
pub struct CategorizeStats {
    pub processed: usize,
    pub fallbacks: usize,
    pub skipped_incomplete: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(
        github: &'a dyn GithubApi,
        completer: &'a dyn Completer,
        catalog: &'a Catalog,
        delay: Duration,
    ) -> Self {
        Classifier {
            github,
            completer,
            catalog,
            system_prompt: prompt::build_system_prompt(catalog),
            delay,
        }
    }

    /// Ask the model for category ids. Unknown ids are already filtered out;
    /// an empty Ok means the model answered with nothing usable.
    pub async fn classify(&self, meta: &RepoMeta) -> Result<Vec<String>, ClassifyError> {
        let readme = self.github.fetch_readme(&meta.full_name).await;
        let user_message = prompt::build_user_message(meta, &readme);
        let content = self
            .completer
            .complete(&self.system_prompt, &user_message)
            .await?;
        prompt::parse_categories(&content, self.catalog)
    }

    /// Classify every entry not yet present in `store`, saving after each one.
    pub async fn run(
        &self,
        entries: &[Entry],
        store: &mut CategoryStore,
        store_path: &Path,
        limit: Option<usize>,
    ) -> Result<CategorizeStats> {
        let mut stats = CategorizeStats::default();

        // same name twice in urls.json: the first one wins
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending: Vec<(&Entry, &RepoMeta)> = Vec::new();
        for entry in entries {
            match &entry.meta {
                Some(meta) if !store.is_categorized(&meta.name) => {
                    if seen.insert(meta.name.as_str()) {
                        pending.push((entry, meta));
                    }
                }
                Some(_) => {}
                None => {
                    info!("Skipping {} (not fetched yet)", entry.url);
                    stats.skipped_incomplete += 1;
                }
            }
        }
        if let Some(n) = limit {
            pending.truncate(n);
        }

        println!("Already categorized: {} repos", store.categorized_count());
        if stats.skipped_incomplete > 0 {
            println!("Not fetched yet: {} repos", stats.skipped_incomplete);
        }
        println!("Repos to categorize: {}", pending.len());
        if pending.is_empty() {
            println!("No new repos to categorize.");
            return Ok(stats);
        }

        let total = pending.len();
        for (i, (entry, meta)) in pending.into_iter().enumerate() {
            println!("[{}/{}] Categorizing: {}", i + 1, total, meta.name);

            let categories = match self.classify(meta).await {
                Ok(ids) => ids,
                Err(ClassifyError::Parse { raw, source }) => {
                    warn!("JSON parse error for {}: {}", meta.name, source);
                    warn!("Raw content: {}", raw);
                    Vec::new()
                }
                Err(e) => {
                    warn!("Error for {}: {}", meta.name, e);
                    Vec::new()
                }
            };

            let categories = if categories.is_empty() {
                println!("  -> No categories returned (fallback to {})", OTHER);
                stats.fallbacks += 1;
                vec![OTHER.to_string()]
            } else {
                println!("  -> Categories: {:?}", categories);
                categories
            };

            store.add(Membership {
                name: meta.name.clone(),
                full_name: meta.full_name.clone(),
                url: entry.url.clone(),
                description: meta.description.clone(),
                stars: meta.stars,
                categories,
                categorized_at: Utc::now().to_rfc3339(),
            });
            stats.processed += 1;

            store.save(store_path)?;
            println!("  -> Saved progress");

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(stats)
    }
}

pub fn print_summary(store: &CategoryStore, stats: &CategorizeStats) {
    println!("\n=== Summary ===");
    for (_, record) in store.iter() {
        println!("{}: {} repos", record.name, record.repos.len());
    }
    println!("\nNewly categorized: {}", stats.processed);
    println!("Total repos in categories: {}", store.total_memberships());
}

// ── Tests ──
