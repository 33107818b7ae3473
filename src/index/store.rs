// file: src/index/store.rs
// description: injectable context store and the bounded in-memory index
// reference: single-writer lock over shared process state

use crate::config::IndexConfig;
use crate::index::similarity::Fingerprint;
use crate::models::{ContextMatch, DeclarationKind, DeclarationNode, Language, SourceUnit};
use crate::utils::Validator;
use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::debug;

/// Lookup of previously processed declarations.
///
/// Implementations must answer a batch of queries from one consistent view:
/// a concurrent `index` call is either fully visible or not visible at all.
pub trait ContextStore: Send + Sync {
    /// Ranked matches per query (score descending, ties by insertion order).
    /// An empty store yields empty match lists.
    fn search_batch(&self, queries: &[&DeclarationNode]) -> Vec<Vec<ContextMatch>>;

    /// Add the declarations of a processed unit.
    fn index(&self, unit: &SourceUnit, nodes: &[&DeclarationNode]);

    fn stats(&self) -> IndexStats;

    fn search(&self, query: &DeclarationNode) -> Vec<ContextMatch> {
        self.search_batch(&[query])
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.stats().entries
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    pub capacity: usize,
    pub evicted: u64,
}

#[derive(Debug, Clone)]
struct IndexedElement {
    seq: u64,
    key: String,
    node_id: String,
    unit_path: String,
    name: String,
    kind: DeclarationKind,
    language: Language,
    snippet: String,
    fingerprint: Fingerprint,
}

#[derive(Debug, Default)]
struct IndexState {
    entries: VecDeque<IndexedElement>,
    next_seq: u64,
    evicted: u64,
}

/// In-memory index bounded by `max_entries`; the least recently indexed
/// element is evicted first.
pub struct InMemoryContextIndex {
    state: RwLock<IndexState>,
    config: IndexConfig,
}

impl InMemoryContextIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            config,
        }
    }

    fn key(unit_path: &str, node: &DeclarationNode) -> String {
        format!("{}::{}", unit_path, node.qualified_name)
    }

    fn rank(&self, state: &IndexState, query: &DeclarationNode) -> Vec<ContextMatch> {
        let fingerprint = Fingerprint::of(query);
        let query_key = query
            .id
            .rsplit_once('@')
            .map(|(key, _)| key)
            .unwrap_or(&query.id);

        let mut scored: Vec<(f32, &IndexedElement)> = state
            .entries
            .iter()
            .filter(|e| e.key != query_key)
            .map(|e| (fingerprint.score(&e.fingerprint), e))
            .filter(|(score, _)| *score >= self.config.min_score)
            .collect();

        scored.sort_by(|(a, ea), (b, eb)| {
            b.partial_cmp(a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| ea.seq.cmp(&eb.seq))
        });
        scored.truncate(self.config.top_k);

        scored
            .into_iter()
            .map(|(score, e)| ContextMatch {
                node_id: e.node_id.clone(),
                unit_path: e.unit_path.clone(),
                name: e.name.clone(),
                kind: e.kind,
                language: e.language,
                snippet: e.snippet.clone(),
                score,
            })
            .collect()
    }
}

impl ContextStore for InMemoryContextIndex {
    fn search_batch(&self, queries: &[&DeclarationNode]) -> Vec<Vec<ContextMatch>> {
        let state = self.state.read();
        if state.entries.is_empty() {
            return vec![Vec::new(); queries.len()];
        }
        queries.iter().map(|q| self.rank(&state, q)).collect()
    }

    fn index(&self, unit: &SourceUnit, nodes: &[&DeclarationNode]) {
        if nodes.is_empty() {
            return;
        }

        let elements: Vec<IndexedElement> = nodes
            .iter()
            .map(|node| IndexedElement {
                seq: 0,
                key: Self::key(&unit.path, node),
                node_id: node.id.clone(),
                unit_path: unit.path.clone(),
                name: node.name.clone(),
                kind: node.kind,
                language: unit.language,
                snippet: Validator::truncate_text(&node.source, self.config.snippet_chars),
                fingerprint: Fingerprint::of(node),
            })
            .collect();

        let mut state = self.state.write();
        for mut element in elements {
            state.entries.retain(|e| e.key != element.key);
            element.seq = state.next_seq;
            state.next_seq += 1;
            state.entries.push_back(element);
        }

        let mut evicted = 0;
        while state.entries.len() > self.config.max_entries {
            state.entries.pop_front();
            evicted += 1;
        }
        state.evicted += evicted;

        debug!(
            "Indexed {} declarations from {} ({} entries, {} evicted)",
            nodes.len(),
            unit.path,
            state.entries.len(),
            evicted
        );
    }

    fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            entries: state.entries.len(),
            capacity: self.config.max_entries,
            evicted: state.evicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceSpan, flatten};
    use crate::parser::GrammarRegistry;
    use std::sync::Arc;

    fn config(max_entries: usize) -> IndexConfig {
        IndexConfig {
            max_entries,
            top_k: 3,
            min_score: 0.0,
            snippet_chars: 40,
        }
    }

    fn node(path: &str, name: &str, source: &str) -> DeclarationNode {
        DeclarationNode {
            id: DeclarationNode::make_id(path, name, 1),
            kind: DeclarationKind::Function,
            name: name.to_string(),
            qualified_name: name.to_string(),
            span: SourceSpan {
                start_line: 1,
                end_line: 1,
                start_byte: 0,
                end_byte: source.len(),
            },
            signature: source.to_string(),
            doc_comment: None,
            source: source.to_string(),
            children: vec![],
        }
    }

    fn unit(path: &str) -> SourceUnit {
        SourceUnit::new(path.to_string(), Language::Python, "x".to_string())
    }

    #[test]
    fn test_empty_index_returns_no_matches() {
        let index = InMemoryContextIndex::new(config(10));
        let query = node("q.py", "greet", "def greet(): pass");

        assert!(index.is_empty());
        assert!(index.search(&query).is_empty());
        assert_eq!(index.search_batch(&[&query, &query]), vec![vec![], vec![]]);
    }

    #[test]
    fn test_ranked_by_score_then_insertion_order() {
        let index = InMemoryContextIndex::new(config(10));
        let first = node("a.py", "greet_user", "def greet_user(user): pass");
        let second = node("b.py", "greet_user", "def greet_user(user): pass");
        let weak = node("c.py", "user_count", "def user_count(): pass");
        index.index(&unit("a.py"), &[&first]);
        index.index(&unit("c.py"), &[&weak]);
        index.index(&unit("b.py"), &[&second]);

        let query = node("q.py", "greet_user", "def greet_user(user): pass");
        let matches = index.search(&query);
        let paths: Vec<&str> = matches.iter().map(|m| m.unit_path.as_str()).collect();

        assert_eq!(paths, vec!["a.py", "b.py", "c.py"]);
        assert_eq!(matches[0].score, matches[1].score);
        assert!(matches[1].score > matches[2].score);
    }

    #[test]
    fn test_top_k_and_min_score() {
        let mut cfg = config(10);
        cfg.top_k = 1;
        cfg.min_score = 0.5;
        let index = InMemoryContextIndex::new(cfg);
        index.index(
            &unit("a.py"),
            &[
                &node("a.py", "parse_config", "def parse_config(path): pass"),
                &node("a.py", "render", "def render(): pass"),
            ],
        );

        let matches = index.search(&node("q.py", "parse_config", "def parse_config(path): pass"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "parse_config");
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let index = InMemoryContextIndex::new(config(2));
        for path in ["a.py", "b.py", "c.py"] {
            index.index(&unit(path), &[&node(path, "greet", "def greet(): pass")]);
        }

        let stats = index.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evicted, 1);

        let matches = index.search(&node("q.py", "greet", "def greet(): pass"));
        let paths: Vec<&str> = matches.iter().map(|m| m.unit_path.as_str()).collect();
        assert_eq!(paths, vec!["b.py", "c.py"]);
    }

    #[test]
    fn test_reindex_replaces_and_skips_self() {
        let index = InMemoryContextIndex::new(config(10));
        let original = node("a.py", "greet", "def greet(): pass");
        index.index(&unit("a.py"), &[&original]);
        index.index(&unit("b.py"), &[&node("b.py", "greet", "def greet(): pass")]);
        index.index(&unit("a.py"), &[&original]);
        assert_eq!(index.len(), 2);

        // a query for a.py::greet must not be matched against itself
        let matches = index.search(&original);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].unit_path, "b.py");
    }

    #[test]
    fn test_snippet_is_truncated() {
        let index = InMemoryContextIndex::new(config(10));
        let long = format!("def long_function():\n{}", "    x = 1\n".repeat(20));
        index.index(&unit("a.py"), &[&node("a.py", "long_function", &long)]);

        let matches = index.search(&node("q.py", "long_function", "def long_function(): pass"));
        assert!(matches[0].snippet.ends_with("..."));
        assert!(matches[0].snippet.chars().count() <= 43);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let index = Arc::new(InMemoryContextIndex::new(config(1000)));
        let source = "class Shape:\n    def area(self):\n        return 0\n";
        let unit = SourceUnit::new("shape.py".to_string(), Language::Python, source.to_string());
        let nodes = GrammarRegistry::new().extract(&unit).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = index.clone();
                let nodes = nodes.clone();
                std::thread::spawn(move || {
                    let unit = SourceUnit::new(
                        format!("shape_{}.py", i),
                        Language::Python,
                        "x".to_string(),
                    );
                    let flat = flatten(&nodes);
                    index.index(&unit, &flat);
                    let batch = index.search_batch(&flat);
                    assert_eq!(batch.len(), flat.len());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(index.len(), 16);
    }
}
