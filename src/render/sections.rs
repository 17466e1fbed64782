use std::collections::{HashMap, HashSet};

use chrono::{Months, NaiveDate};

use crate::catalog::{Catalog, REJECTED};
use crate::model::{CategoryDef, Entry, Membership, RepoMeta, UNKNOWN};
use crate::store::CategoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Age {
    Active,
    HallOfFame,
    Artefact,
}

/// Release-age thresholds, in months before the run date.
#[derive(Debug, Clone, Copy)]
pub struct AgingPolicy {
    pub hall_of_fame_months: u32,
    pub artefacts_months: u32,
}

impl Default for AgingPolicy {
    fn default() -> Self {
        AgingPolicy {
            hall_of_fame_months: 6,
            artefacts_months: 12,
        }
    }
}

impl AgingPolicy {
    /// Unknown dates count as active.
    pub fn age(&self, updated: Option<NaiveDate>, today: NaiveDate) -> Age {
        let Some(updated) = updated else {
            return Age::Active;
        };
        let before = |months: u32| today.checked_sub_months(Months::new(months));
        if before(self.artefacts_months).is_some_and(|cutoff| updated < cutoff) {
            Age::Artefact
        } else if before(self.hall_of_fame_months).is_some_and(|cutoff| updated < cutoff) {
            Age::HallOfFame
        } else {
            Age::Active
        }
    }
}

/// One table row, already resolved to live or snapshot data.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub url: String,
    pub description: String,
    pub stars: u64,
    pub version: String,
    pub updated_at: String,
}

impl Row {
    fn live(url: &str, meta: &RepoMeta) -> Self {
        Row {
            name: meta.name.clone(),
            url: url.to_string(),
            description: meta.description.clone(),
            stars: meta.stars,
            version: meta.version.clone(),
            updated_at: meta.updated_at.clone(),
        }
    }

    fn snapshot(m: &Membership) -> Self {
        Row {
            name: m.name.clone(),
            url: m.url.clone(),
            description: if m.description.is_empty() {
                UNKNOWN.to_string()
            } else {
                m.description.clone()
            },
            stars: m.stars,
            version: UNKNOWN.to_string(),
            updated_at: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub description: String,
    pub rows: Vec<Row>,
}

impl Section {
    fn new(def: &CategoryDef, rows: Vec<Row>) -> Self {
        Section {
            title: def.name.to_string(),
            description: def.description.to_string(),
            rows: sorted_by_stars(rows),
        }
    }
}

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Partition the entries into the README sections, in output order:
/// catalog categories, Uncategorized, Hall of Fame, Artefacts. Empty
/// sections are left out.
pub fn build_sections(
    entries: &[Entry],
    store: &CategoryStore,
    catalog: &Catalog,
    policy: &AgingPolicy,
    today: NaiveDate,
) -> Vec<Section> {
    let rejected: HashSet<&str> = store.members(REJECTED).iter().map(|m| m.name.as_str()).collect();

    let mut live: HashMap<&str, (&Entry, &RepoMeta)> = HashMap::new();
    for entry in entries {
        if let Some(meta) = &entry.meta {
            if !rejected.contains(meta.name.as_str()) {
                live.entry(meta.name.as_str()).or_insert((entry, meta));
            }
        }
    }

    let mut aged: HashSet<&str> = HashSet::new();
    let mut hall_of_fame = Vec::new();
    let mut artefacts = Vec::new();
    let mut active: Vec<(&Entry, &RepoMeta)> = Vec::new();
    for entry in entries {
        let Some(meta) = &entry.meta else { continue };
        if rejected.contains(meta.name.as_str()) {
            continue;
        }
        match policy.age(meta.updated_date(), today) {
            Age::Active => active.push((entry, meta)),
            Age::HallOfFame => {
                aged.insert(meta.name.as_str());
                hall_of_fame.push(Row::live(&entry.url, meta));
            }
            Age::Artefact => {
                aged.insert(meta.name.as_str());
                artefacts.push(Row::live(&entry.url, meta));
            }
        }
    }

    let mut sections = Vec::new();
    let mut categorized: HashSet<&str> = HashSet::new();
    for def in catalog.categories() {
        let members = store.members(def.id);
        categorized.extend(members.iter().map(|m| m.name.as_str()));
        if def.id == REJECTED {
            continue;
        }
        let rows: Vec<Row> = members
            .iter()
            .filter(|m| !rejected.contains(m.name.as_str()) && !aged.contains(m.name.as_str()))
            .map(|m| match live.get(m.name.as_str()) {
                Some((entry, meta)) => Row::live(&entry.url, meta),
                None => Row::snapshot(m),
            })
            .collect();
        sections.push(Section::new(def, rows));
    }

    let uncategorized: Vec<Row> = active
        .iter()
        .filter(|(_, meta)| !categorized.contains(meta.name.as_str()))
        .map(|(entry, meta)| Row::live(&entry.url, meta))
        .collect();
    sections.push(Section {
        title: UNCATEGORIZED.to_string(),
        description: String::new(),
        rows: sorted_by_stars(uncategorized),
    });

    sections.push(Section::new(catalog.hall_of_fame(), hall_of_fame));
    sections.push(Section::new(catalog.artefacts(), artefacts));

    sections.retain(|s| !s.rows.is_empty());
    sections
}

/// Stars descending; equal stars keep their input order.
fn sorted_by_stars(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort_by(|a, b| b.stars.cmp(&a.stars));
    rows
}
