#[cfg(test)]
pub mod mock;
pub mod real;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::model::Entry;

pub use real::RealGithub;

/// Number of README characters handed to the classifier.
pub const README_MAX_CHARS: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

/// GitHub REST API, the subset the jobs need.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Repository metadata plus latest release. None when the repository
    /// lookup itself fails; a missing release only yields "-" fields.
    async fn fetch_repo(&self, owner: &str, repo: &str) -> Option<Entry>;

    /// First `README_MAX_CHARS` characters of the README, "" on any failure.
    async fn fetch_readme(&self, full_name: &str) -> String;

    /// Open issues of `repository` (owner/name), pull requests excluded.
    async fn open_issues(&self, repository: &str) -> Result<Vec<Issue>>;

    async fn comment_issue(&self, repository: &str, number: u64, body: &str) -> Result<()>;

    async fn close_issue(&self, repository: &str, number: u64) -> Result<()>;
}
