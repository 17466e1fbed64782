use serde_json::Value;
use tracing::debug;

use super::ClassifyError;
use crate::catalog::{Catalog, OTHER, REJECTED};
use crate::model::RepoMeta;

pub fn build_system_prompt(catalog: &Catalog) -> String {
    let categories_text = catalog
        .categories()
        .iter()
        .enumerate()
        .map(|(i, cat)| {
            format!(
                "{}. {} ({})\n   Description: {}\n   Examples: {}\n   Best for: {}",
                i + 1,
                cat.name,
                cat.id,
                cat.description,
                cat.examples.join(", "),
                cat.best_for
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let valid_ids = serde_json::to_string(&catalog.ids()).unwrap_or_default();

    format!(
        r#"You are an expert at categorizing web scraping and data extraction tools.

Given a repository's name, description, topics, and README excerpt, classify it into one or more of the following categories.
A repo can belong to multiple categories if it fits multiple purposes.

Categories:
{categories_text}

IMPORTANT RULES:
- If a repo is related to web scraping/crawling but doesn't fit the main categories, use "{OTHER}"
- If a repo is NOT related to web scraping, crawling, or data extraction at all, use "{REJECTED}"
- Every repo MUST be assigned to at least one category (including "{OTHER}" or "{REJECTED}")

Respond with ONLY a JSON array of category IDs (strings) that apply to this repository.
Valid category IDs are: {valid_ids}

Example responses:
["full_featured_frameworks"]
["browser_automation", "evasion_fingerprinting"]
["http_clients"]
["parsers_extractors", "data_cleaning"]
["{OTHER}"]
["{REJECTED}"]

Do not include any explanation, just the JSON array."#
    )
}

pub fn build_user_message(meta: &RepoMeta, readme_excerpt: &str) -> String {
    let description = if meta.description.is_empty() {
        "No description"
    } else {
        &meta.description
    };
    let mut message = format!(
        "Repository: {}\nFull name: {}\nDescription: {}\nTopics: {}",
        meta.name,
        meta.full_name,
        description,
        meta.topics.join(", ")
    );
    if !readme_excerpt.is_empty() {
        message.push_str("\n\nREADME excerpt:\n");
        message.push_str(readme_excerpt);
    }
    message
}

/// Remove a surrounding ``` / ```json fence, if any.
fn strip_fence(content: &str) -> &str {
    let content = content.trim();
    if !content.starts_with("```") {
        return content;
    }
    let inner = content.split("```").nth(1).unwrap_or("");
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

/// Parse the model's answer into known category ids. Unknown ids are dropped;
/// anything that is not a JSON array is an error.
pub fn parse_categories(content: &str, catalog: &Catalog) -> Result<Vec<String>, ClassifyError> {
    let body = strip_fence(content);
    let values: Vec<Value> = serde_json::from_str(body).map_err(|source| ClassifyError::Parse {
        raw: content.to_string(),
        source,
    })?;

    let mut ids: Vec<String> = Vec::new();
    for value in values {
        match value.as_str() {
            Some(id) if catalog.contains(id) => {
                if !ids.iter().any(|known| known == id) {
                    ids.push(id.to_string());
                }
            }
            _ => debug!("Dropping unknown category {}", value),
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::default_scraping()
    }

    #[test]
    fn plain_array() {
        let ids = parse_categories(r#"["browser_automation", "evasion_fingerprinting"]"#, &catalog()).unwrap();
        assert_eq!(ids, vec!["browser_automation", "evasion_fingerprinting"]);
    }

    #[test]
    fn fenced_array() {
        let fenced = "```json\n[\"http_clients\"]\n```";
        assert_eq!(parse_categories(fenced, &catalog()).unwrap(), vec!["http_clients"]);
        let bare_fence = "```\n[\"other\"]\n```";
        assert_eq!(parse_categories(bare_fence, &catalog()).unwrap(), vec!["other"]);
    }

    #[test]
    fn unknown_ids_and_duplicates_dropped() {
        let ids = parse_categories(
            r#"["web_crawlers", "data_cleaning", 42, "data_cleaning", "hall_of_fame"]"#,
            &catalog(),
        )
        .unwrap();
        assert_eq!(ids, vec!["data_cleaning"]);
    }

    #[test]
    fn not_json_is_an_error() {
        let err = parse_categories("not json", &catalog()).unwrap_err();
        match err {
            ClassifyError::Parse { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_categories(r#"{"categories": ["other"]}"#, &catalog()).is_err());
    }

    #[test]
    fn system_prompt_lists_every_category() {
        let catalog = catalog();
        let prompt = build_system_prompt(&catalog);
        for id in catalog.ids() {
            assert!(prompt.contains(&format!("({})", id)), "missing {id}");
        }
        assert!(prompt.contains(r#"use "other""#));
        assert!(prompt.contains(r#"use "rejected""#));
        assert!(prompt.contains(r#"Valid category IDs are: ["full_featured_frameworks","#));
        assert!(prompt.contains("1. Full-Featured Frameworks (full_featured_frameworks)"));
    }

    #[test]
    fn user_message_fields() {
        let meta = RepoMeta {
            name: "colly".into(),
            full_name: "gocolly/colly".into(),
            description: String::new(),
            stars: 22000,
            version: "v2.1.0".into(),
            updated_at: "2020-06-08".into(),
            topics: vec!["go".into(), "crawler".into()],
        };
        let msg = build_user_message(&meta, "");
        assert_eq!(
            msg,
            "Repository: colly\nFull name: gocolly/colly\nDescription: No description\nTopics: go, crawler"
        );
        let msg = build_user_message(&meta, "# Colly");
        assert!(msg.ends_with("\n\nREADME excerpt:\n# Colly"));
    }
}
