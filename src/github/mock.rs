use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{GithubApi, Issue};
use crate::model::Entry;

/// In-memory GitHub for tests: canned responses plus a record of writes.
#[derive(Default)]
pub struct MockGithub {
    /// key: "owner/repo"
    repos: Mutex<HashMap<String, Entry>>,
    /// key: "owner/repo"
    readmes: Mutex<HashMap<String, String>>,
    issues: Mutex<Vec<Issue>>,
    pub fetched: Mutex<Vec<String>>,
    pub comments: Mutex<Vec<(u64, String)>>,
    pub closed: Mutex<Vec<u64>>,
    /// Issue numbers whose comment call fails.
    pub failing_comments: Mutex<Vec<u64>>,
}

impl MockGithub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_repo(&self, full_name: &str, entry: Entry) {
        self.repos
            .lock()
            .unwrap()
            .insert(full_name.to_string(), entry);
    }

    pub fn set_readme(&self, full_name: &str, text: &str) {
        self.readmes
            .lock()
            .unwrap()
            .insert(full_name.to_string(), text.to_string());
    }

    pub fn add_issue(&self, number: u64, title: &str, body: Option<&str>) {
        self.issues.lock().unwrap().push(Issue {
            number,
            title: title.to_string(),
            body: body.map(str::to_string),
            pull_request: None,
        });
    }
}

#[async_trait]
impl GithubApi for MockGithub {
    async fn fetch_repo(&self, owner: &str, repo: &str) -> Option<Entry> {
        let key = format!("{}/{}", owner, repo);
        self.fetched.lock().unwrap().push(key.clone());
        self.repos.lock().unwrap().get(&key).cloned()
    }

    async fn fetch_readme(&self, full_name: &str) -> String {
        self.readmes
            .lock()
            .unwrap()
            .get(full_name)
            .cloned()
            .unwrap_or_default()
    }

    async fn open_issues(&self, _repository: &str) -> Result<Vec<Issue>> {
        Ok(self.issues.lock().unwrap().clone())
    }

    async fn comment_issue(&self, _repository: &str, number: u64, body: &str) -> Result<()> {
        if self.failing_comments.lock().unwrap().contains(&number) {
            bail!("comment on #{} rejected", number);
        }
        self.comments
            .lock()
            .unwrap()
            .push((number, body.to_string()));
        Ok(())
    }

    async fn close_issue(&self, _repository: &str, number: u64) -> Result<()> {
        self.closed.lock().unwrap().push(number);
        Ok(())
    }
}
