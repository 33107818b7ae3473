// file: src/parser/grammar.rs
// description: grammar providers selected per language and their registry
// reference: https://docs.rs/tree-sitter

use crate::error::{PipelineError, Result};
use crate::models::{DeclarationNode, Language, SourceUnit};
use crate::parser::extractor::DeclarationExtractor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Turns a source unit into its declaration tree.
pub trait GrammarProvider: Send + Sync {
    fn language(&self) -> Language;

    fn extract(&self, unit: &SourceUnit) -> Result<Vec<DeclarationNode>>;
}

/// Grammar provider backed by a tree-sitter grammar.
pub struct TreeSitterGrammar {
    language: Language,
    grammar: tree_sitter::Language,
}

impl TreeSitterGrammar {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            grammar: language.grammar(),
        }
    }

    fn parse(&self, unit: &SourceUnit) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|e| PipelineError::ParseFailure {
                path: unit.path.clone(),
                message: format!("grammar for {} could not be loaded: {}", self.language, e),
            })?;

        let tree = parser
            .parse(unit.content.as_bytes(), None)
            .ok_or_else(|| PipelineError::ParseFailure {
                path: unit.path.clone(),
                message: "parser returned no tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error(root) {
                Some(node) if node.is_missing() => format!(
                    "missing `{}` at line {}, column {}",
                    node.kind(),
                    node.start_position().row + 1,
                    node.start_position().column + 1
                ),
                Some(node) => format!(
                    "syntax error at line {}, column {}",
                    node.start_position().row + 1,
                    node.start_position().column + 1
                ),
                None => "syntax error".to_string(),
            };
            return Err(PipelineError::ParseFailure {
                path: unit.path.clone(),
                message,
            });
        }

        Ok(tree)
    }
}

impl GrammarProvider for TreeSitterGrammar {
    fn language(&self) -> Language {
        self.language
    }

    fn extract(&self, unit: &SourceUnit) -> Result<Vec<DeclarationNode>> {
        let tree = self.parse(unit)?;
        let extractor = DeclarationExtractor::new(self.language, &unit.path, unit.content.as_bytes());
        let nodes = extractor.extract(tree.root_node());

        debug!(
            "Extracted {} top-level declarations from {}",
            nodes.len(),
            unit.path
        );
        Ok(nodes)
    }
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Language → grammar provider lookup, resolved once per source unit.
#[derive(Clone)]
pub struct GrammarRegistry {
    providers: HashMap<Language, Arc<dyn GrammarProvider>>,
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarRegistry {
    /// Registry with a tree-sitter grammar for every supported language.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for language in Language::ALL {
            registry.register(Arc::new(TreeSitterGrammar::new(language)));
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn GrammarProvider>) {
        self.providers.insert(provider.language(), provider);
    }

    pub fn provider(&self, language: Language) -> Result<Arc<dyn GrammarProvider>> {
        self.providers
            .get(&language)
            .cloned()
            .ok_or_else(|| PipelineError::UnsupportedLanguage(language.to_string()))
    }

    pub fn extract(&self, unit: &SourceUnit) -> Result<Vec<DeclarationNode>> {
        self.provider(unit.language)?.extract(unit)
    }
}
