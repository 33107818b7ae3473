// file: src/index/similarity.rs
// description: identifier-token fingerprints and similarity scoring
// reference: lexical matching in place of a BM25 search backend

use crate::models::{DeclarationKind, DeclarationNode};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

const NAME_WEIGHT: f32 = 0.5;
const BODY_WEIGHT: f32 = 0.4;
const KIND_WEIGHT: f32 = 0.1;
const MAX_TOKENIZED_BYTES: usize = 8 * 1024;

lazy_static! {
    // Splits camelCase, PascalCase and snake_case into words.
    static ref WORD: Regex = Regex::new(r"[A-Z]+[a-z0-9]*|[a-z0-9]+").unwrap();
    static ref STOPWORDS: HashSet<&'static str> = [
        "def", "class", "return", "self", "this", "public", "private", "protected", "static",
        "void", "int", "const", "let", "var", "function", "new", "import", "from", "include",
        "std", "if", "else", "for", "while", "true", "false", "null", "none", "the",
    ]
    .into_iter()
    .collect();
}

/// Token sets derived from a declaration.
#[derive(Debug, Clone, Default)]
pub struct Fingerprint {
    pub kind: Option<DeclarationKind>,
    pub name_tokens: HashSet<String>,
    pub tokens: HashSet<String>,
}

impl Fingerprint {
    pub fn of(node: &DeclarationNode) -> Self {
        let body = truncate_at_boundary(&node.source, MAX_TOKENIZED_BYTES);
        let mut tokens = tokenize(body);
        tokens.extend(tokenize(&node.signature));

        Self {
            kind: Some(node.kind),
            name_tokens: tokenize(&node.name),
            tokens,
        }
    }

    /// Weighted blend of name overlap, body overlap and kind agreement, in [0, 1].
    pub fn score(&self, other: &Fingerprint) -> f32 {
        let kind = match (self.kind, other.kind) {
            (Some(a), Some(b)) if a == b => 1.0,
            _ => 0.0,
        };

        NAME_WEIGHT * jaccard(&self.name_tokens, &other.name_tokens)
            + BODY_WEIGHT * jaccard(&self.tokens, &other.tokens)
            + KIND_WEIGHT * kind
    }
}

pub fn tokenize(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .filter(|t| t.len() > 1 && !STOPWORDS.contains(t.as_str()))
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

fn truncate_at_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceSpan;

    fn node(name: &str, kind: DeclarationKind, source: &str) -> DeclarationNode {
        DeclarationNode {
            id: format!("t::{}@L1", name),
            kind,
            name: name.to_string(),
            qualified_name: name.to_string(),
            span: SourceSpan {
                start_line: 1,
                end_line: 1,
                start_byte: 0,
                end_byte: source.len(),
            },
            signature: source.lines().next().unwrap_or_default().to_string(),
            doc_comment: None,
            source: source.to_string(),
            children: vec![],
        }
    }

    #[test]
    fn test_tokenize_splits_identifiers() {
        let tokens = tokenize("getUserName(user_id) -> HTTPServer");
        for expected in ["get", "user", "name", "id", "httpserver"] {
            assert!(tokens.contains(expected), "missing {}", expected);
        }
        assert!(tokenize("def self return").is_empty());
    }

    #[test]
    fn test_identical_declarations_score_one() {
        let a = Fingerprint::of(&node("greet", DeclarationKind::Function, "def greet(name): pass"));
        let b = Fingerprint::of(&node("greet", DeclarationKind::Function, "def greet(name): pass"));
        assert!((a.score(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_related_beats_unrelated() {
        let query = Fingerprint::of(&node(
            "greetUser",
            DeclarationKind::Function,
            "function greetUser(user) { return 'Hello ' + user.name; }",
        ));
        let related = Fingerprint::of(&node(
            "greet",
            DeclarationKind::Function,
            "def greet(user): return 'Hello ' + user.name",
        ));
        let unrelated = Fingerprint::of(&node(
            "Matrix",
            DeclarationKind::Class,
            "class Matrix { double det(); }",
        ));

        assert!(query.score(&related) > query.score(&unrelated));
        assert!(query.score(&unrelated) < 0.1);
    }

    #[test]
    fn test_truncate_at_boundary() {
        assert_eq!(truncate_at_boundary("héllo", 2), "h");
        assert_eq!(truncate_at_boundary("abc", 10), "abc");
    }
}
