//! Turn "add <github-url>" issues into new urls.json entries.

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::warn;

use crate::github::{GithubApi, Issue};
use crate::model::Entry;
use crate::settings::Settings;
use crate::store;
use crate::utils::normalize_url;

static ADD_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)add\s+(https://github\.com/[\w.-]+/[\w.-]+)").unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No "add <url>" in the issue; left open.
    Ignored,
    Duplicate,
    Added,
}

/// Search the title first, then the body.
pub fn extract_github_url(issue: &Issue) -> Option<String> {
    [Some(issue.title.as_str()), issue.body.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|text| ADD_URL_RE.captures(text).map(|c| c[1].to_string()))
}

fn duplicate_comment(url: &str) -> String {
    format!(
        "Thanks for the suggestion!\n\n\
         However, **{}** is already in our list.\n\n\
         Closing this issue as a duplicate.",
        url
    )
}

fn added_comment(url: &str) -> String {
    format!(
        "Thanks for the suggestion!\n\n\
         **{}** has been added to the list.\n\n\
         The README will be updated automatically.",
        url
    )
}

pub struct Ingestor<'a> {
    github: &'a dyn GithubApi,
    repository: &'a str,
}

impl<'a> Ingestor<'a> {
    pub fn new(github: &'a dyn GithubApi, repository: &'a str) -> Self {
        Ingestor { github, repository }
    }

    /// Handle one issue. `entries` and `existing` are updated in place when
    /// the url is new.
    pub async fn process_issue(
        &self,
        issue: &Issue,
        entries: &mut Vec<Entry>,
        existing: &mut HashSet<String>,
    ) -> Outcome {
        let Some(url) = extract_github_url(issue) else {
            return Outcome::Ignored;
        };
        let normalized = normalize_url(&url);
        println!("Processing issue #{}: found URL {}", issue.number, url);

        if existing.contains(&normalized) {
            self.reply_and_close(issue.number, &duplicate_comment(&url)).await;
            println!("  -> Duplicate, closed issue #{}", issue.number);
            return Outcome::Duplicate;
        }

        entries.push(Entry::minimal(url.as_str()));
        existing.insert(normalized);
        self.reply_and_close(issue.number, &added_comment(&url)).await;
        println!("  -> Added, closed issue #{}", issue.number);
        Outcome::Added
    }

    /// Process every open issue; returns how many urls were added.
    pub async fn run(&self, entries: &mut Vec<Entry>) -> Result<usize> {
        let mut existing: HashSet<String> = entries.iter().map(|e| normalize_url(&e.url)).collect();

        let issues = self.github.open_issues(self.repository).await?;
        println!("Found {} open issues", issues.len());

        let mut added = 0;
        for issue in &issues {
            if let Outcome::Added = self.process_issue(issue, entries, &mut existing).await {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn reply_and_close(&self, number: u64, comment: &str) {
        if let Err(e) = self.github.comment_issue(self.repository, number, comment).await {
            warn!("Failed to comment on issue #{}: {:#}", number, e);
        }
        if let Err(e) = self.github.close_issue(self.repository, number).await {
            warn!("Failed to close issue #{}: {:#}", number, e);
        }
    }
}

/// The whole ingest job. urls.json is backed up and rewritten only when at
/// least one url was added. Returns the number added.
pub async fn run(github: &dyn GithubApi, settings: &Settings) -> Result<usize> {
    let repository = settings.require_github_repository()?;
    println!("Processing issues for {}", repository);

    let mut entries = store::load_entries_or_empty(&settings.urls_path)?;
    println!("Loaded {} existing URLs", entries.len());

    let added = Ingestor::new(github, repository).run(&mut entries).await?;

    if added > 0 {
        store::backup(&settings.urls_path, &settings.history_dir)?;
        store::save_entries(&entries, &settings.urls_path)?;
        println!("\nAdded {} new URL(s) to {}", added, settings.urls_path.display());
    } else {
        println!("\nNo new URLs added");
    }
    Ok(added)
}
