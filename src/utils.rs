//! Common helpers shared by the jobs.

use std::sync::LazyLock;

use regex::Regex;

static REPO_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://github\.com/([^/]+)/([^/]+)/?").unwrap());

/// Canonical form used for duplicate and blacklist checks.
pub fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}

/// Extract (owner, repo) from a GitHub repository URL.
pub fn extract_repo_info(url: &str) -> Option<(String, String)> {
    let caps = REPO_URL_RE.captures(url)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Cut to `max` characters, appending "..." when something was dropped.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

/// 1234567 -> "1,234,567"
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
