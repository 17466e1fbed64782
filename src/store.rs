//! Flat-file persistence: urls.json, its history, the blacklist and
//! categories.json.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Serialize, Serializer};
use tracing::info;

use crate::catalog::Catalog;
use crate::model::{CategoryRecord, Entry, Membership};
use crate::utils::normalize_url;

// ── Entries ──

pub fn load_entries(path: &Path) -> Result<Vec<Entry>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let entries = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(entries)
}

/// Like `load_entries`, but a missing file is an empty list.
pub fn load_entries_or_empty(path: &Path) -> Result<Vec<Entry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_entries(path)
}

/// Overwrite `path` with the full list. Order is kept as given.
pub fn save_entries(entries: &[Entry], path: &Path) -> Result<()> {
    write_pretty(path, &entries, b"    ")?;
    info!("Wrote {} with {} repositories", path.display(), entries.len());
    Ok(())
}

/// Move the current file into `history_dir` under a timestamped name.
/// Returns None when there was nothing to move.
pub fn backup(path: &Path, history_dir: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        info!("No {} found to back up", path.display());
        return Ok(None);
    }

    fs::create_dir_all(history_dir)
        .with_context(|| format!("creating {}", history_dir.display()))?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("backup");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, timestamp, ext),
        None => format!("{}_{}", stem, timestamp),
    };
    let target = history_dir.join(file_name);

    fs::rename(path, &target)
        .with_context(|| format!("moving {} to {}", path.display(), target.display()))?;
    info!("Moved {} to {}", path.display(), target.display());
    Ok(Some(target))
}

// ── Blacklist ──

/// One url per line; blank lines and `#` comments are skipped.
pub fn load_blacklist(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_blacklist(&raw))
}

fn parse_blacklist(raw: &str) -> HashSet<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(normalize_url)
        .collect()
}

pub fn filter_blacklisted(entries: Vec<Entry>, blacklist: &HashSet<String>) -> Vec<Entry> {
    if blacklist.is_empty() {
        return entries;
    }
    let before = entries.len();
    let kept: Vec<Entry> = entries
        .into_iter()
        .filter(|e| {
            let hit = blacklist.contains(&normalize_url(&e.url));
            if hit {
                info!("Blacklisted, removing {}", e.url);
            }
            !hit
        })
        .collect();
    let removed = before - kept.len();
    if removed > 0 {
        info!("Removed {} blacklisted repositories", removed);
    }
    kept
}

// ── Categories ──

/// Membership lists per category, kept in catalog order.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    records: Vec<(&'static str, CategoryRecord)>,
    categorized: HashSet<String>,
}

impl CategoryStore {
    pub fn empty(catalog: &Catalog) -> Self {
        CategoryStore {
            records: catalog
                .categories()
                .iter()
                .map(|def| (def.id, CategoryRecord::from_def(def)))
                .collect(),
            categorized: HashSet::new(),
        }
    }

    /// Merge an existing categories.json into the catalog. Names listed under
    /// ids the catalog no longer knows still count as categorized.
    pub fn load(path: &Path, catalog: &Catalog) -> Result<Self> {
        let mut store = Self::empty(catalog);
        if !path.exists() {
            return Ok(store);
        }

        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let existing: HashMap<String, CategoryRecord> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

        for (id, record) in existing {
            store
                .categorized
                .extend(record.repos.iter().map(|m| m.name.clone()));
            if let Some((_, slot)) = store.records.iter_mut().find(|(known, _)| *known == id) {
                slot.repos = record.repos;
            }
        }
        Ok(store)
    }

    /// Sort every list by stars (descending, stable) and write the file.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        for (_, record) in &mut self.records {
            record.repos.sort_by(|a, b| b.stars.cmp(&a.stars));
        }
        write_pretty(path, &OrderedRecords(&self.records), b"  ")
    }

    pub fn is_categorized(&self, name: &str) -> bool {
        self.categorized.contains(name)
    }

    pub fn categorized_count(&self) -> usize {
        self.categorized.len()
    }

    /// Append the membership to every category it names. Ids outside the
    /// catalog are ignored.
    pub fn add(&mut self, membership: Membership) {
        for (id, record) in &mut self.records {
            if membership.categories.iter().any(|c| c == id) {
                record.repos.push(membership.clone());
            }
        }
        self.categorized.insert(membership.name);
    }

    pub fn members(&self, id: &str) -> &[Membership] {
        self.records
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(_, r)| r.repos.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CategoryRecord)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }

    pub fn total_memberships(&self) -> usize {
        self.records.iter().map(|(_, r)| r.repos.len()).sum()
    }
}

struct OrderedRecords<'a>(&'a [(&'static str, CategoryRecord)]);

impl Serialize for OrderedRecords<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(id, record)| (*id, record)))
    }
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T, indent: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    fs::write(path, buf).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepoMeta;

    fn meta(name: &str, stars: u64) -> RepoMeta {
        RepoMeta {
            name: name.to_string(),
            full_name: format!("owner/{}", name),
            description: format!("{} does things", name),
            stars,
            version: "v1.0.0".to_string(),
            updated_at: "2024-03-01".to_string(),
            topics: vec!["scraping".to_string()],
        }
    }

    fn membership(name: &str, stars: u64, categories: &[&str]) -> Membership {
        Membership {
            name: name.to_string(),
            full_name: format!("owner/{}", name),
            url: format!("https://github.com/owner/{}", name),
            description: String::new(),
            stars,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            categorized_at: "2024-06-15T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn entries_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.json");
        let entries = vec![
            Entry::complete("https://github.com/owner/alpha", meta("alpha", 10)),
            Entry::minimal("https://github.com/owner/beta"),
            Entry::complete(
                "https://github.com/owner/gamma",
                RepoMeta {
                    version: "-".into(),
                    updated_at: "-".into(),
                    ..meta("gamma", 0)
                },
            ),
        ];
        save_entries(&entries, &path).unwrap();
        let loaded = load_entries(&path).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn missing_entries_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.json");
        assert!(load_entries(&path).is_err());
        assert!(load_entries_or_empty(&path).unwrap().is_empty());
    }

    #[test]
    fn backup_moves_file_into_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.json");
        let history = dir.path().join("history");
        fs::write(&path, "[]").unwrap();

        let moved = backup(&path, &history).unwrap().unwrap();
        assert!(!path.exists());
        assert!(moved.exists());
        assert_eq!(moved.parent(), Some(history.as_path()));
        let name = moved.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("urls_"));
        assert!(name.ends_with(".json"));
        assert_eq!(fs::read_to_string(&moved).unwrap(), "[]");
    }

    #[test]
    fn backup_without_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("history");
        let moved = backup(&dir.path().join("urls.json"), &history).unwrap();
        assert!(moved.is_none());
        assert!(!history.exists());
    }

    #[test]
    fn blacklist_parsing_and_filtering() {
        let set = parse_blacklist(
            "# spam\n\nhttps://github.com/Spam/Repo/\n  https://github.com/other/junk  \n",
        );
        assert_eq!(set.len(), 2);
        assert!(set.contains("https://github.com/spam/repo"));

        let entries = vec![
            Entry::minimal("https://github.com/spam/repo"),
            Entry::minimal("https://github.com/good/repo"),
            Entry::minimal("https://github.com/OTHER/junk/"),
        ];
        let kept = filter_blacklisted(entries, &set);
        assert_eq!(kept, vec![Entry::minimal("https://github.com/good/repo")]);
    }

    #[test]
    fn missing_blacklist_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = load_blacklist(&dir.path().join("blacklist.txt")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn category_store_merges_and_sorts() {
        let catalog = Catalog::default_scraping();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        fs::write(
            &path,
            r#"{
                "http_clients": {"name": "Old name", "repos": [
                    {"name": "httpx", "url": "https://github.com/encode/httpx", "stars": 10}
                ]},
                "retired_category": {"repos": [
                    {"name": "legacy", "url": "https://github.com/x/legacy", "stars": 1}
                ]}
            }"#,
        )
        .unwrap();

        let mut store = CategoryStore::load(&path, &catalog).unwrap();
        assert!(store.is_categorized("httpx"));
        assert!(store.is_categorized("legacy"));
        assert_eq!(store.members("http_clients").len(), 1);

        store.add(membership("got", 50, &["http_clients", "other", "bogus"]));
        assert!(store.is_categorized("got"));
        assert_eq!(store.members("other").len(), 1);
        store.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["http_clients"]["name"], "HTTP Clients & Request Libraries");
        assert_eq!(value["http_clients"]["repos"][0]["name"], "got");
        assert_eq!(value["http_clients"]["repos"][1]["name"], "httpx");
        assert!(value.get("retired_category").is_none());
        assert!(value.get("bogus").is_none());
        // catalog order is kept on disk
        assert!(raw.find("full_featured_frameworks").unwrap() < raw.find("rejected").unwrap());

        let reloaded = CategoryStore::load(&path, &catalog).unwrap();
        assert_eq!(reloaded.total_memberships(), 3);
    }
}
