// file: src/models/declaration.rs
// description: structural elements extracted from a source unit
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Function,
    Class,
    Import,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Class => "class",
            DeclarationKind::Import => "import",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a declaration in its unit. Lines are 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationNode {
    /// Unique within a request: `<unit path>::<qualified name>@L<line>`.
    pub id: String,
    pub kind: DeclarationKind,
    pub name: String,
    pub qualified_name: String,
    pub span: SourceSpan,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_comment: Option<String>,
    #[serde(default, skip_serializing)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DeclarationNode>,
}

impl DeclarationNode {
    pub fn make_id(unit_path: &str, qualified_name: &str, start_line: usize) -> String {
        format!("{}::{}@L{}", unit_path, qualified_name, start_line)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(DeclarationNode::count).sum::<usize>()
    }

    /// Pre-order walk of this subtree.
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a DeclarationNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// Flatten a forest in declaration order (parents before their members).
pub fn flatten(nodes: &[DeclarationNode]) -> Vec<&DeclarationNode> {
    let mut out = Vec::new();
    for node in nodes {
        node.walk(&mut out);
    }
    out
}
