// file: src/parser/mod.rs
// description: structural extraction module exports
// reference: internal module structure

pub mod extractor;
pub mod grammar;

pub use extractor::DeclarationExtractor;
pub use grammar::{GrammarProvider, GrammarRegistry, TreeSitterGrammar};
