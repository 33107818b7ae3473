// file: src/llm/prompt.rs
// description: per-language prompt templates for declaration documentation
// reference: documentation conventions of each supported language

use crate::models::{ContextMatch, DeclarationNode, Language};
use crate::utils::Validator;

const MAX_CODE_CHARS: usize = 12_000;

pub(crate) const HEADER_PREFIX: &str = "Generate documentation for the following";
pub(crate) const EXISTING_DOCS_HEADING: &str = "Existing documentation:";
pub(crate) const CONTEXT_HEADING: &str = "Similar code patterns found:";

/// Prompt wording bound to one language variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub language: Language,
    pub convention: &'static str,
    pub fence: &'static str,
}

impl PromptTemplate {
    pub fn for_language(language: Language) -> Self {
        let (convention, fence) = match language {
            Language::Python => ("PEP 257 docstrings", "python"),
            Language::Java => ("Javadoc", "java"),
            Language::Cpp => ("Doxygen", "cpp"),
            Language::C => ("Doxygen", "c"),
            Language::JavaScript => ("JSDoc", "javascript"),
        };

        Self {
            language,
            convention,
            fence,
        }
    }

    pub fn render(&self, node: &DeclarationNode, context: &[ContextMatch]) -> String {
        let mut prompt = format!(
            "{} {} {} `{}`.\nFollow {} conventions.\n\n",
            HEADER_PREFIX,
            self.language.display_name(),
            node.kind,
            node.qualified_name,
            self.convention
        );

        if let Some(doc) = node.doc_comment.as_deref().filter(|d| !d.trim().is_empty()) {
            prompt.push_str(EXISTING_DOCS_HEADING);
            prompt.push('\n');
            prompt.push_str(doc.trim());
            prompt.push_str("\n\n");
        }

        let code = if node.source.is_empty() {
            node.signature.as_str()
        } else {
            node.source.as_str()
        };
        prompt.push_str(&format!(
            "Code:\n```{}\n{}\n```\n\n",
            self.fence,
            Validator::truncate_text(code, MAX_CODE_CHARS)
        ));

        if !context.is_empty() {
            prompt.push_str(CONTEXT_HEADING);
            prompt.push('\n');
            for m in context {
                prompt.push_str(&format!("- {}\n", m.format_summary()));
            }
            prompt.push('\n');
        }

        prompt.push_str(
            "Write each section as its own paragraph, starting with the section name:\n\
             Overview: overall purpose and functionality\n\
             Methods: method and function descriptions with parameters and return values\n\
             Examples: usage examples\n\
             Dependencies: dependencies and requirements\n\
             Notes: important notes, warnings and edge cases\n",
        );

        prompt
    }
}
