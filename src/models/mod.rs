// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod context_match;
pub mod declaration;
pub mod documentation;
pub mod language;
pub mod source_unit;

pub use context_match::ContextMatch;
pub use declaration::{DeclarationKind, DeclarationNode, SourceSpan, flatten};
pub use documentation::{
    DocSections, DocumentationResult, DocumentationSummary, FileDocumentation, NodeDocumentation,
    NodeOutcome,
};
pub use language::Language;
pub use source_unit::SourceUnit;
