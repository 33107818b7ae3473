// file: src/models/context_match.rs
// description: similar declarations retrieved from the context index
// reference: Used for similarity lookups against previously indexed code

use crate::models::{DeclarationKind, Language};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextMatch {
    /// Id of the indexed declaration this match refers to
    pub node_id: String,

    /// Path of the unit the declaration was indexed from
    pub unit_path: String,

    pub name: String,
    pub kind: DeclarationKind,
    pub language: Language,

    /// Truncated source of the indexed declaration
    pub snippet: String,

    /// Similarity score (higher is more similar, 0.0-1.0)
    pub score: f32,
}

impl ContextMatch {
    /// One-line form used inside generation prompts
    pub fn format_summary(&self) -> String {
        format!(
            "{} `{}` from {} (score {:.2}):\n{}",
            self.kind, self.name, self.unit_path, self.score, self.snippet
        )
    }
}
