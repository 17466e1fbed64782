//! Refresh urls.json from GitHub and regenerate the README.
//!
//! The blacklist applies whether or not the refresh runs; only a refresh
//! rewrites urls.json.

pub mod markdown;
pub mod sections;

use std::fs;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::github::GithubApi;
use crate::model::Entry;
use crate::settings::Settings;
use crate::store::{self, CategoryStore};
use crate::utils::extract_repo_info;
use sections::AgingPolicy;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Query GitHub and rewrite urls.json before rendering.
    pub refresh: bool,
    pub include_toc: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct RefreshStats {
    pub refreshed: usize,
    pub kept: usize,
    pub invalid: usize,
}

/// Re-fetch every entry. Failed lookups and unparseable urls keep the
/// stored record, so nothing is dropped here.
pub async fn refresh_entries(github: &dyn GithubApi, entries: Vec<Entry>) -> (Vec<Entry>, RefreshStats) {
    let mut stats = RefreshStats::default();
    let mut out = Vec::with_capacity(entries.len());

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    for entry in entries {
        let Some((owner, repo)) = extract_repo_info(&entry.url) else {
            warn!("Invalid GitHub URL: {}", entry.url);
            stats.invalid += 1;
            out.push(entry);
            pb.inc(1);
            continue;
        };

        match github.fetch_repo(&owner, &repo).await {
            Some(fresh) => {
                stats.refreshed += 1;
                out.push(fresh);
            }
            None => {
                stats.kept += 1;
                out.push(entry);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        "Refreshed {} repositories ({} kept from last run, {} invalid urls)",
        stats.refreshed, stats.kept, stats.invalid
    );
    (out, stats)
}

/// The whole render job. Returns the README text that was written.
pub async fn run(
    github: &dyn GithubApi,
    settings: &Settings,
    catalog: &Catalog,
    options: RenderOptions,
    today: NaiveDate,
) -> Result<String> {
    let entries = store::load_entries(&settings.urls_path)?;
    println!("Loaded {} repositories from {}", entries.len(), settings.urls_path.display());

    let blacklist = store::load_blacklist(&settings.blacklist_path)?;
    let entries = store::filter_blacklisted(entries, &blacklist);

    let entries = if options.refresh {
        let (entries, stats) = refresh_entries(github, entries).await;
        println!(
            "Refreshed {} ({} unchanged after failed lookups, {} invalid urls)",
            stats.refreshed, stats.kept, stats.invalid
        );
        store::backup(&settings.urls_path, &settings.history_dir)?;
        store::save_entries(&entries, &settings.urls_path)?;
        entries
    } else {
        entries
    };

    let categories = CategoryStore::load(&settings.categories_path, catalog)?;
    let policy = AgingPolicy {
        hall_of_fame_months: settings.hall_of_fame_months,
        artefacts_months: settings.artefacts_months,
    };
    let sections = sections::build_sections(&entries, &categories, catalog, &policy, today);
    let readme = markdown::render_document(&sections, options.include_toc);

    fs::write(&settings.readme_path, &readme)
        .with_context(|| format!("writing {}", settings.readme_path.display()))?;
    println!("Updated {}", settings.readme_path.display());
    Ok(readme)
}
