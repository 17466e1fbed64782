//! README assembly: tables, table of contents and the document frame.

use super::sections::{Row, Section};
use crate::utils::{thousands, truncate};

pub const TITLE: &str = "# awesome-scraping";
pub const INTRO: &str = "A curated list of awesome scraping tools and libraries.";
const EMPTY_LIST: &str = "_No repositories found._";
const DESCRIPTION_MAX_CHARS: usize = 80;

const TABLE_HEADER: &str = "| Repository | Description | ⭐ Stars | Version | Updated |\n\
                            |------------|-------------|-------|---------|---------|";

/// GitHub-style heading anchor: "AI & LLM-Powered Scrapers" -> "ai--llm-powered-scrapers".
pub fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}

/// Make text safe to embed in a table cell.
pub fn sanitize_cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
        .replace(" | ", " ")
        .replace('|', "")
}

fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

fn description_cell(description: &str) -> String {
    let clean = sanitize_cell(description);
    if clean.chars().count() <= DESCRIPTION_MAX_CHARS {
        return clean;
    }
    format!(
        "<span title=\"{}\">{}</span>",
        escape_attr(&clean),
        truncate(&clean, DESCRIPTION_MAX_CHARS)
    )
}

pub fn format_row(row: &Row) -> String {
    format!(
        "| <a href=\"{}\" target=\"_blank\">{}</a> | {} | {} | {} | {} |",
        row.url,
        sanitize_cell(&row.name),
        description_cell(&row.description),
        thousands(row.stars),
        sanitize_cell(&row.version),
        sanitize_cell(&row.updated_at),
    )
}

pub fn render_table(rows: &[Row]) -> String {
    let mut lines = vec![TABLE_HEADER.to_string()];
    lines.extend(rows.iter().map(format_row));
    lines.join("\n")
}

fn render_toc(sections: &[Section]) -> String {
    let mut out = String::from("## Table of Contents\n\n");
    for section in sections {
        out.push_str(&format!("- [{}](#{})\n", section.title, anchor(&section.title)));
    }
    out
}

/// Sections are expected in output order with no empty tables.
pub fn render_document(sections: &[Section], include_toc: bool) -> String {
    let mut out = format!("{}\n\n{}\n\n", TITLE, INTRO);

    if sections.is_empty() {
        out.push_str(EMPTY_LIST);
        out.push('\n');
        return out;
    }

    if include_toc {
        out.push_str(&render_toc(sections));
        out.push('\n');
    }

    for section in sections {
        out.push_str(&format!("## {}\n\n", section.title));
        if !section.description.is_empty() {
            out.push_str(&format!("_{}_\n\n", section.description));
        }
        out.push_str(&render_table(&section.rows));
        out.push_str("\n\n");
    }

    let mut doc = out.trim_end().to_string();
    doc.push('\n');
    doc
}
