// file: src/parser/extractor.rs
// description: normalizes a tree-sitter syntax tree into declaration nodes
// reference: https://docs.rs/tree-sitter

use crate::models::{DeclarationKind, DeclarationNode, Language, SourceSpan};
use tree_sitter::Node;

const ANONYMOUS: &str = "<anonymous>";
const MAX_SIGNATURE_CHARS: usize = 200;

/// Walks declaration containers (translation units, class bodies, namespaces)
/// and keeps functions, classes and imports. Function bodies are not entered.
pub struct DeclarationExtractor<'s> {
    language: Language,
    unit_path: &'s str,
    source: &'s [u8],
}

impl<'s> DeclarationExtractor<'s> {
    pub fn new(language: Language, unit_path: &'s str, source: &'s [u8]) -> Self {
        Self {
            language,
            unit_path,
            source,
        }
    }

    pub fn extract(&self, root: Node<'_>) -> Vec<DeclarationNode> {
        let mut out = Vec::new();
        self.visit_children(root, &[], &mut out);
        out
    }

    fn visit_children(&self, container: Node<'_>, scope: &[String], out: &mut Vec<DeclarationNode>) {
        let mut cursor = container.walk();
        let children: Vec<Node<'_>> = container.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child, scope, out);
        }
    }

    fn visit(&self, node: Node<'_>, scope: &[String], out: &mut Vec<DeclarationNode>) {
        match self.language {
            Language::Python => self.visit_python(node, scope, out),
            Language::Java => self.visit_java(node, scope, out),
            Language::C | Language::Cpp => self.visit_c_family(node, scope, out),
            Language::JavaScript => self.visit_javascript(node, scope, out),
        }
    }

    fn visit_python(&self, node: Node<'_>, scope: &[String], out: &mut Vec<DeclarationNode>) {
        match node.kind() {
            "function_definition" => {
                let name = self.field_text(node, "name");
                out.push(self.leaf(node, DeclarationKind::Function, name, scope));
            }
            "class_definition" => {
                let name = self.field_text(node, "name");
                out.push(self.class(node, name, node.child_by_field_name("body"), scope));
            }
            "decorated_definition" => {
                if let Some(definition) = node.child_by_field_name("definition") {
                    self.visit(definition, scope, out);
                }
            }
            "import_statement" => {
                let mut cursor = node.walk();
                let modules: Vec<String> = node
                    .children_by_field_name("name", &mut cursor)
                    .map(|n| self.text(n).to_string())
                    .collect();
                out.push(self.import(node, modules.join(", ")));
            }
            "import_from_statement" => {
                let module = self.field_text(node, "module_name");
                out.push(self.import(node, module));
            }
            _ => {}
        }
    }

    fn visit_java(&self, node: Node<'_>, scope: &[String], out: &mut Vec<DeclarationNode>) {
        match node.kind() {
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => {
                let name = self.field_text(node, "name");
                out.push(self.class(node, name, node.child_by_field_name("body"), scope));
            }
            "method_declaration" | "constructor_declaration" => {
                let name = self.field_text(node, "name");
                out.push(self.leaf(node, DeclarationKind::Function, name, scope));
            }
            "enum_body_declarations" => self.visit_children(node, scope, out),
            "import_declaration" => {
                let name = self
                    .text(node)
                    .trim()
                    .trim_start_matches("import")
                    .trim()
                    .trim_end_matches(';')
                    .trim()
                    .to_string();
                out.push(self.import(node, name));
            }
            _ => {}
        }
    }

    fn visit_c_family(&self, node: Node<'_>, scope: &[String], out: &mut Vec<DeclarationNode>) {
        match node.kind() {
            "function_definition" => {
                let name = node
                    .child_by_field_name("declarator")
                    .and_then(|d| self.declarator_name(d))
                    .unwrap_or_else(|| ANONYMOUS.to_string());
                out.push(self.leaf(node, DeclarationKind::Function, name, scope));
            }
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                self.visit_record(node, None, scope, out);
            }
            "declaration" | "field_declaration" | "type_definition" => {
                // `struct S {..} s;` and `typedef struct {..} S;`
                if let Some(ty) = node.child_by_field_name("type") {
                    let fallback = node
                        .child_by_field_name("declarator")
                        .and_then(|d| self.declarator_name(d));
                    self.visit_record(ty, fallback, scope, out);
                }
            }
            "namespace_definition" => {
                if let Some(body) = node.child_by_field_name("body") {
                    let mut inner = scope.to_vec();
                    if let Some(name) = node.child_by_field_name("name") {
                        inner.push(self.text(name).to_string());
                    }
                    self.visit_children(body, &inner, out);
                }
            }
            "linkage_specification" => {
                if let Some(body) = node.child_by_field_name("body") {
                    if body.kind() == "declaration_list" {
                        self.visit_children(body, scope, out);
                    } else {
                        self.visit(body, scope, out);
                    }
                }
            }
            "template_declaration" | "preproc_if" | "preproc_ifdef" | "preproc_else"
            | "preproc_elif" | "declaration_list" => self.visit_children(node, scope, out),
            "preproc_include" => {
                let path = node
                    .child_by_field_name("path")
                    .map(|p| {
                        self.text(p)
                            .trim_matches(|c| c == '<' || c == '>' || c == '"')
                            .to_string()
                    })
                    .unwrap_or_default();
                out.push(self.import(node, path));
            }
            _ => {}
        }
    }

    /// Struct, class and union specifiers count only when they carry a body.
    fn visit_record(
        &self,
        node: Node<'_>,
        fallback_name: Option<String>,
        scope: &[String],
        out: &mut Vec<DeclarationNode>,
    ) {
        if !matches!(
            node.kind(),
            "class_specifier" | "struct_specifier" | "union_specifier"
        ) {
            return;
        }
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .or(fallback_name)
            .unwrap_or_else(|| ANONYMOUS.to_string());
        out.push(self.class(node, name, Some(body), scope));
    }

    fn visit_javascript(&self, node: Node<'_>, scope: &[String], out: &mut Vec<DeclarationNode>) {
        match node.kind() {
            "class_declaration" => {
                let name = self.field_text(node, "name");
                out.push(self.class(node, name, node.child_by_field_name("body"), scope));
            }
            "function_declaration" | "generator_function_declaration" | "method_definition" => {
                let name = self.field_text(node, "name");
                out.push(self.leaf(node, DeclarationKind::Function, name, scope));
            }
            "export_statement" => {
                if let Some(declaration) = node.child_by_field_name("declaration") {
                    self.visit(declaration, scope, out);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = node.walk();
                let declarators: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
                for declarator in declarators {
                    let Some(value) = declarator.child_by_field_name("value") else {
                        continue;
                    };
                    let name = self.field_text(declarator, "name");
                    match value.kind() {
                        "arrow_function" | "function_expression" | "function"
                        | "generator_function" => {
                            out.push(self.leaf(node, DeclarationKind::Function, name, scope));
                        }
                        "class" => {
                            out.push(self.class(
                                node,
                                name,
                                value.child_by_field_name("body"),
                                scope,
                            ));
                        }
                        _ => {}
                    }
                }
            }
            "import_statement" => {
                let source = node
                    .child_by_field_name("source")
                    .map(|s| {
                        self.text(s)
                            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                            .to_string()
                    })
                    .unwrap_or_default();
                out.push(self.import(node, source));
            }
            _ => {}
        }
    }

    /// Innermost name of a C/C++ declarator chain.
    fn declarator_name(&self, node: Node<'_>) -> Option<String> {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "qualified_identifier"
            | "destructor_name" | "operator_name" => Some(self.text(node).to_string()),
            _ => {
                if let Some(inner) = node.child_by_field_name("declarator") {
                    return self.declarator_name(inner);
                }
                // reference declarators carry no field name
                let mut cursor = node.walk();
                let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
                children.into_iter().find_map(|c| self.declarator_name(c))
            }
        }
    }

    fn class(
        &self,
        node: Node<'_>,
        name: String,
        body: Option<Node<'_>>,
        scope: &[String],
    ) -> DeclarationNode {
        let mut children = Vec::new();
        if let Some(body) = body {
            let mut inner = scope.to_vec();
            inner.push(name.clone());
            self.visit_children(body, &inner, &mut children);
        }
        self.build(node, DeclarationKind::Class, name, scope, children)
    }

    fn leaf(
        &self,
        node: Node<'_>,
        kind: DeclarationKind,
        name: String,
        scope: &[String],
    ) -> DeclarationNode {
        self.build(node, kind, name, scope, Vec::new())
    }

    fn import(&self, node: Node<'_>, name: String) -> DeclarationNode {
        self.build(node, DeclarationKind::Import, name, &[], Vec::new())
    }

    fn build(
        &self,
        node: Node<'_>,
        kind: DeclarationKind,
        name: String,
        scope: &[String],
        children: Vec<DeclarationNode>,
    ) -> DeclarationNode {
        let qualified_name = if scope.is_empty() {
            name.clone()
        } else {
            format!("{}::{}", scope.join("::"), name)
        };
        let start_line = node.start_position().row + 1;
        let source = self.text(node).to_string();

        DeclarationNode {
            id: DeclarationNode::make_id(self.unit_path, &qualified_name, start_line),
            kind,
            name,
            qualified_name,
            span: SourceSpan {
                start_line,
                end_line: node.end_position().row + 1,
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
            },
            signature: signature_of(&source),
            doc_comment: self.doc_comment(node),
            source,
            children,
        }
    }

    fn doc_comment(&self, node: Node<'_>) -> Option<String> {
        if self.language == Language::Python
            && let Some(docstring) = self.python_docstring(node)
        {
            return Some(docstring);
        }

        // Comments sit in front of the wrapper, not the wrapped declaration.
        let anchor = match node.parent() {
            Some(parent)
                if matches!(
                    parent.kind(),
                    "export_statement" | "decorated_definition" | "template_declaration"
                ) =>
            {
                parent
            }
            _ => node,
        };

        anchor
            .prev_named_sibling()
            .filter(|sibling| sibling.kind().contains("comment"))
            .map(|comment| self.text(comment).trim().to_string())
    }

    fn python_docstring(&self, node: Node<'_>) -> Option<String> {
        let body = node.child_by_field_name("body")?;
        let mut cursor = body.walk();
        let first = body.named_children(&mut cursor).next()?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let mut inner = first.walk();
        let string = first.named_children(&mut inner).next()?;
        if string.kind() != "string" {
            return None;
        }

        let text = self
            .text(string)
            .trim()
            .trim_start_matches(|c: char| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B' | 'f' | 'F'))
            .trim_matches(|c| c == '"' || c == '\'')
            .trim()
            .to_string();
        Some(text)
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|n| self.text(n).to_string())
            .unwrap_or_else(|| ANONYMOUS.to_string())
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.source).unwrap_or_default()
    }
}

fn signature_of(source: &str) -> String {
    let line = source.lines().next().unwrap_or_default().trim();
    let line = line.trim_end_matches('{').trim_end();
    if line.chars().count() > MAX_SIGNATURE_CHARS {
        let truncated: String = line.chars().take(MAX_SIGNATURE_CHARS).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}
