// file: src/llm/fallback.rs
// description: deterministic offline model used when no API key is configured
// reference: summarises a declaration from its rendered prompt

use crate::error::{PipelineError, Result};
use crate::llm::GenerativeModel;
use crate::llm::prompt::{CONTEXT_HEADING, EXISTING_DOCS_HEADING, HEADER_PREFIX};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADER: Regex = Regex::new(&format!(
        r"(?m)^{} (.+?) (function|class|import) `([^`]+)`\.",
        regex::escape(HEADER_PREFIX)
    ))
    .unwrap();
    static ref CODE_START: Regex = Regex::new(r"(?m)^Code:\n```[a-z]*\n").unwrap();
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackModel;

impl FallbackModel {
    pub const NAME: &'static str = "offline-fallback";

    pub fn new() -> Self {
        Self
    }

    fn summarize(prompt: &str) -> Result<String> {
        let caps = HEADER.captures(prompt).ok_or_else(|| {
            PipelineError::GenerationFailure("prompt does not describe a declaration".to_string())
        })?;
        let language = &caps[1];
        let kind = &caps[2];
        let name = &caps[3];

        let existing = section_after(prompt, EXISTING_DOCS_HEADING);
        let signature = CODE_START
            .find(prompt)
            .and_then(|m| prompt[m.end()..].lines().next())
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("```"));
        let related = section_after(prompt, CONTEXT_HEADING)
            .map(|block| block.lines().filter(|l| l.starts_with("- ")).count())
            .unwrap_or(0);

        let mut paragraphs = Vec::new();
        paragraphs.push(match existing {
            Some(doc) => format!("Overview: {} {} `{}`. {}", language, kind, name, doc),
            None => format!(
                "Overview: {} {} `{}`. No existing documentation was found in the source.",
                language, kind, name
            ),
        });

        match (kind, signature) {
            ("import", _) => paragraphs.push(format!(
                "Dependencies: `{}` must be available when this unit is built or loaded.",
                name
            )),
            (_, Some(signature)) => paragraphs.push(format!("Methods: `{}`", signature)),
            _ => {}
        }

        let mut notes = "Notes: Generated offline from the declaration signature; \
                         configure a generation API key for full documentation."
            .to_string();
        if related > 0 {
            notes.push_str(&format!(" {} similar declarations were indexed.", related));
        }
        paragraphs.push(notes);

        Ok(paragraphs.join("\n\n"))
    }
}

/// Text between `heading` and the next blank line.
fn section_after<'a>(prompt: &'a str, heading: &str) -> Option<&'a str> {
    let start = prompt.find(heading)? + heading.len();
    let rest = prompt[start..].trim_start_matches('\n');
    let end = rest.find("\n\n").unwrap_or(rest.len());
    Some(rest[..end].trim()).filter(|s| !s.is_empty())
}

#[async_trait]
impl GenerativeModel for FallbackModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_remote(&self) -> bool {
        false
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        Self::summarize(prompt)
    }
}
