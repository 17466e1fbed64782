use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder for version / date when no release is known.
pub const UNKNOWN: &str = "-";

/// One tracked repository, as stored in urls.json.
///
/// Freshly submitted entries carry only the url; `meta` is filled in by the
/// render job once the GitHub API has been queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub url: String,
    #[serde(flatten)]
    pub meta: Option<RepoMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMeta {
    pub name: String,
    pub full_name: String,
    #[serde(default = "unknown")]
    pub description: String,
    pub stars: u64,
    #[serde(default = "unknown")]
    pub version: String,
    #[serde(default = "unknown")]
    pub updated_at: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

impl Entry {
    pub fn minimal(url: impl Into<String>) -> Self {
        Entry {
            url: url.into(),
            meta: None,
        }
    }

    pub fn complete(url: impl Into<String>, meta: RepoMeta) -> Self {
        Entry {
            url: url.into(),
            meta: Some(meta),
        }
    }
}

impl RepoMeta {
    /// Release date, or None for "-" and anything that does not parse.
    pub fn updated_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.updated_at, "%Y-%m-%d").ok()
    }
}

/// Snapshot of an entry taken when it was classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub categorized_at: String,
}

// ── Categories ──

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub examples: &'static [&'static str],
    pub best_for: &'static str,
}

/// Category record as written to categories.json.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub best_for: String,
    #[serde(default)]
    pub repos: Vec<Membership>,
}

impl CategoryRecord {
    pub fn from_def(def: &CategoryDef) -> Self {
        CategoryRecord {
            name: def.name.to_string(),
            description: def.description.to_string(),
            examples: def.examples.iter().map(|e| e.to_string()).collect(),
            best_for: def.best_for.to_string(),
            repos: Vec::new(),
        }
    }
}
