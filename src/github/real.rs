use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use chrono::DateTime;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{GithubApi, Issue, README_MAX_CHARS};
use crate::model::{Entry, RepoMeta, UNKNOWN};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const README_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("awesome-scraping/", env!("CARGO_PKG_VERSION"));

pub struct RealGithub {
    client: Client,
    api: String,
    token: Option<String>,
}

impl RealGithub {
    pub fn new(api: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building GitHub client")?;
        Ok(RealGithub {
            client,
            api: api.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn with_headers(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.with_headers(self.client.get(format!("{}{}", self.api, path)))
    }

    async fn latest_release(&self, owner: &str, repo: &str) -> Option<ReleaseResponse> {
        let resp = self
            .get(&format!("/repos/{}/{}/releases/latest", owner, repo))
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            debug!("No release for {}/{}: {}", owner, repo, resp.status());
            return None;
        }
        resp.json().await.ok()
    }
}

#[async_trait]
impl GithubApi for RealGithub {
    async fn fetch_repo(&self, owner: &str, repo: &str) -> Option<Entry> {
        let resp = match self.get(&format!("/repos/{}/{}", owner, repo)).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("{} ({})", fetch_line(owner, repo, false), e);
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!("{} ({})", fetch_line(owner, repo, false), resp.status());
            return None;
        }
        let data: RepoResponse = match resp.json().await {
            Ok(data) => data,
            Err(e) => {
                warn!("{} (bad payload: {})", fetch_line(owner, repo, false), e);
                return None;
            }
        };

        let release = self.latest_release(owner, repo).await;
        let entry = build_entry(owner, repo, data, release);
        info!("{}", fetch_line(owner, repo, true));
        Some(entry)
    }

    async fn fetch_readme(&self, full_name: &str) -> String {
        let result: Result<Option<ReadmeResponse>, reqwest::Error> = async {
            let resp = self
                .get(&format!("/repos/{}/readme", full_name))
                .timeout(README_TIMEOUT)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Ok(None);
            }
            resp.json::<ReadmeResponse>().await.map(Some)
        }
        .await;

        match result {
            Ok(Some(readme)) => decode_readme(&readme),
            Ok(None) => String::new(),
            Err(e) => {
                warn!("Failed to fetch README for {}: {}", full_name, e);
                String::new()
            }
        }
    }

    async fn open_issues(&self, repository: &str) -> Result<Vec<Issue>> {
        let issues: Vec<Issue> = self
            .get(&format!("/repos/{}/issues", repository))
            .query(&[("state", "open"), ("per_page", "100")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("parsing issue list")?;
        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .collect())
    }

    async fn comment_issue(&self, repository: &str, number: u64, body: &str) -> Result<()> {
        let url = format!("{}/repos/{}/issues/{}/comments", self.api, repository, number);
        self.with_headers(self.client.post(url))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("commenting on issue #{}", number))?;
        Ok(())
    }

    async fn close_issue(&self, repository: &str, number: u64) -> Result<()> {
        let url = format!("{}/repos/{}/issues/{}", self.api, repository, number);
        self.with_headers(self.client.patch(url))
            .json(&serde_json::json!({ "state": "closed" }))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("closing issue #{}", number))?;
        Ok(())
    }
}

// ── Payloads ──

#[derive(Debug, Default, Deserialize)]
struct RepoResponse {
    name: Option<String>,
    full_name: Option<String>,
    html_url: Option<String>,
    description: Option<String>,
    stargazers_count: Option<u64>,
    #[serde(default)]
    topics: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseResponse {
    tag_name: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReadmeResponse {
    content: Option<String>,
    encoding: Option<String>,
}

/// Per-repository progress line: "Fetching owner/repo ... ok|failed".
fn fetch_line(owner: &str, repo: &str, ok: bool) -> String {
    format!(
        "Fetching {}/{} ... {}",
        owner,
        repo,
        if ok { "ok" } else { "failed" }
    )
}

fn build_entry(owner: &str, repo: &str, data: RepoResponse, release: Option<ReleaseResponse>) -> Entry {
    let (version, updated_at) = match release {
        Some(r) => (
            r.tag_name.unwrap_or_else(|| UNKNOWN.to_string()),
            r.published_at
                .as_deref()
                .map(release_day)
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    };

    let url = data
        .html_url
        .unwrap_or_else(|| format!("https://github.com/{}/{}", owner, repo));
    Entry::complete(
        url,
        RepoMeta {
            name: data.name.unwrap_or_else(|| repo.to_string()),
            full_name: data.full_name.unwrap_or_else(|| format!("{}/{}", owner, repo)),
            description: data
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            stars: data.stargazers_count.unwrap_or(0),
            version,
            updated_at,
            topics: data.topics,
        },
    )
}

/// "2024-05-14T09:12:00Z" -> "2024-05-14" (UTC day).
fn release_day(published_at: &str) -> String {
    DateTime::parse_from_rfc3339(published_at)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| UNKNOWN.to_string())
}

fn decode_readme(readme: &ReadmeResponse) -> String {
    let (Some(content), Some("base64")) = (readme.content.as_deref(), readme.encoding.as_deref())
    else {
        return String::new();
    };
    // GitHub wraps the payload every 60 characters
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    match base64::engine::general_purpose::STANDARD.decode(compact) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .chars()
            .take(README_MAX_CHARS)
            .collect(),
        Err(e) => {
            debug!("README is not valid base64: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_from_full_payload() {
        let data: RepoResponse = serde_json::from_str(
            r#"{"name": "crawlee", "full_name": "apify/crawlee",
                "html_url": "https://github.com/apify/crawlee",
                "description": "Web scraping and browser automation library",
                "stargazers_count": 15000, "topics": ["scraping", "headless"]}"#,
        )
        .unwrap();
        let release = ReleaseResponse {
            tag_name: Some("v3.8.0".into()),
            published_at: Some("2024-03-04T23:30:00Z".into()),
        };
        let entry = build_entry("apify", "crawlee", data, Some(release));
        let meta = entry.meta.unwrap();
        assert_eq!(entry.url, "https://github.com/apify/crawlee");
        assert_eq!(meta.stars, 15000);
        assert_eq!(meta.version, "v3.8.0");
        assert_eq!(meta.updated_at, "2024-03-04");
        assert_eq!(meta.topics, vec!["scraping", "headless"]);
    }

    #[test]
    fn missing_release_uses_placeholders() {
        let entry = build_entry("a", "b", RepoResponse::default(), None);
        let meta = entry.meta.unwrap();
        assert_eq!(entry.url, "https://github.com/a/b");
        assert_eq!(meta.name, "b");
        assert_eq!(meta.full_name, "a/b");
        assert_eq!(meta.description, "-");
        assert_eq!(meta.version, "-");
        assert_eq!(meta.updated_at, "-");
        assert_eq!(meta.stars, 0);
    }

    #[test]
    fn release_without_date() {
        let release = ReleaseResponse {
            tag_name: Some("1.0".into()),
            published_at: None,
        };
        let meta = build_entry("a", "b", RepoResponse::default(), Some(release))
            .meta
            .unwrap();
        assert_eq!(meta.version, "1.0");
        assert_eq!(meta.updated_at, "-");
    }

    #[test]
    fn progress_line_wording() {
        assert_eq!(fetch_line("scrapy", "scrapy", true), "Fetching scrapy/scrapy ... ok");
        assert_eq!(fetch_line("gone", "repo", false), "Fetching gone/repo ... failed");
    }

    #[test]
    fn release_day_uses_utc() {
        assert_eq!(release_day("2024-01-31T23:30:00-02:00"), "2024-02-01");
        assert_eq!(release_day("garbage"), "-");
    }

    #[test]
    fn readme_is_decoded_and_cut() {
        let body = "# Title\n".repeat(300);
        let encoded = base64::engine::general_purpose::STANDARD.encode(body.as_bytes());
        let wrapped: String = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        let readme = ReadmeResponse {
            content: Some(wrapped),
            encoding: Some("base64".into()),
        };
        let text = decode_readme(&readme);
        assert_eq!(text.chars().count(), README_MAX_CHARS);
        assert!(text.starts_with("# Title\n"));

        let plain = ReadmeResponse {
            content: Some("hello".into()),
            encoding: Some("utf-8".into()),
        };
        assert_eq!(decode_readme(&plain), "");
    }
}
