// file: src/models/documentation.rs
// description: per-declaration outcomes aggregated into one response document
// reference: internal data structures

use crate::models::{ContextMatch, DeclarationKind, DeclarationNode, Language, SourceSpan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generated text split into the sections the prompt asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocSections {
    pub overview: String,
    pub methods: Vec<String>,
    pub examples: Vec<String>,
    pub dependencies: Vec<String>,
    pub notes: Vec<String>,
}

/// Result of documenting a single declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NodeOutcome {
    Success {
        text: String,
        sections: DocSections,
        context: Vec<ContextMatch>,
    },
    Failed {
        error: String,
        attempts: u32,
    },
}

impl NodeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, NodeOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocumentation {
    pub node_id: String,
    pub name: String,
    pub qualified_name: String,
    pub kind: DeclarationKind,
    pub span: SourceSpan,
    #[serde(flatten)]
    pub outcome: NodeOutcome,
}

impl NodeDocumentation {
    pub fn new(node: &DeclarationNode, outcome: NodeOutcome) -> Self {
        Self {
            node_id: node.id.clone(),
            name: node.name.clone(),
            qualified_name: node.qualified_name.clone(),
            kind: node.kind,
            span: node.span,
            outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDocumentation {
    pub path: String,
    pub language: Language,
    pub declarations: Vec<DeclarationNode>,
    pub entries: Vec<NodeDocumentation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentationSummary {
    pub files: usize,
    pub declarations: usize,
    pub documented: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationResult {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub summary: DocumentationSummary,
    pub files: Vec<FileDocumentation>,
}

impl DocumentationResult {
    pub fn new(files: Vec<FileDocumentation>) -> Self {
        let mut summary = DocumentationSummary {
            files: files.len(),
            ..Default::default()
        };

        for entry in files.iter().flat_map(|f| f.entries.iter()) {
            summary.declarations += 1;
            if entry.outcome.is_success() {
                summary.documented += 1;
            } else {
                summary.failed += 1;
            }
        }

        Self {
            request_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            summary,
            files,
        }
    }

    /// True when there was something to document and every attempt failed.
    pub fn all_failed(&self) -> bool {
        self.summary.declarations > 0 && self.summary.documented == 0
    }

    pub fn entries(&self) -> impl Iterator<Item = &NodeDocumentation> {
        self.files.iter().flat_map(|f| f.entries.iter())
    }
}
