// file: src/models/source_unit.rs
// description: one submitted source file, immutable once ingested
// reference: internal data structures

use crate::models::Language;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    pub path: String,
    pub language: Language,
    pub content: String,
    pub content_hash: String,
}

impl SourceUnit {
    pub fn new(path: String, language: Language, content: String) -> Self {
        let content_hash = Self::compute_hash(&content);
        Self {
            path,
            language,
            content,
            content_hash,
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unit_creation() {
        let unit = SourceUnit::new(
            "app.py".to_string(),
            Language::Python,
            "def f():\n    pass\n".to_string(),
        );

        assert_eq!(unit.path, "app.py");
        assert_eq!(unit.size(), 18);
        assert_eq!(unit.content_hash.len(), 64);
    }

    #[test]
    fn test_hash_consistency() {
        let hash1 = SourceUnit::compute_hash("int x;");
        let hash2 = SourceUnit::compute_hash("int x;");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, SourceUnit::compute_hash("int y;"));
    }
}
