// file: src/llm/structure.rs
// description: splits generated text into documentation sections
// reference: paragraph classification by leading keyword

use crate::models::DocSections;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\r?\n[ \t]*\r?\n").unwrap();
}

/// Paragraphs are classified by their first word; markdown heading and list
/// markers are ignored. Unclassified paragraphs are dropped, except that the
/// first one stands in for a missing overview.
pub fn structure_documentation(raw: &str) -> DocSections {
    let mut sections = DocSections::default();
    let mut first_unclassified: Option<&str> = None;

    for paragraph in PARAGRAPH_BREAK.split(raw) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        let key = paragraph
            .trim_start_matches(|c: char| {
                c == '#' || c == '*' || c == '-' || c == '.' || c == ')' || c.is_ascii_digit()
                    || c.is_whitespace()
            })
            .to_lowercase();

        if key.starts_with("overview") || key.starts_with("purpose") {
            if sections.overview.is_empty() {
                sections.overview = paragraph.to_string();
            }
        } else if key.starts_with("method") || key.starts_with("function") {
            sections.methods.push(paragraph.to_string());
        } else if key.starts_with("example") {
            sections.examples.push(paragraph.to_string());
        } else if key.starts_with("dependen") {
            sections.dependencies.push(paragraph.to_string());
        } else if key.starts_with("note") || key.starts_with("warning") {
            sections.notes.push(paragraph.to_string());
        } else if first_unclassified.is_none() {
            first_unclassified = Some(paragraph);
        }
    }

    if sections.overview.is_empty()
        && let Some(paragraph) = first_unclassified
    {
        sections.overview = paragraph.to_string();
    }

    sections
}
