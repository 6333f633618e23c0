//! Parseability checks backed by tree-sitter grammars.

use std::path::Path;
use tree_sitter::{Language as TsLanguage, Parser};

use crate::core::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxVerdict {
    Valid,
    Invalid(String),
    /// No grammar for this file type; the check is skipped.
    Unsupported,
}

/// "Can this content still be parsed?"
pub trait SyntaxValidator: Send + Sync {
    fn validate(&self, content: &str, path: &Path) -> SyntaxVerdict;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterValidator;

impl TreeSitterValidator {
    pub fn new() -> Self {
        Self
    }

    fn grammar_for(path: &Path) -> Option<TsLanguage> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let language = match Language::from_extension(ext)? {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript if ext == "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        };
        Some(language)
    }
}

impl SyntaxValidator for TreeSitterValidator {
    fn validate(&self, content: &str, path: &Path) -> SyntaxVerdict {
        let Some(language) = Self::grammar_for(path) else {
            return SyntaxVerdict::Unsupported;
        };

        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&language) {
            return SyntaxVerdict::Invalid(format!("grammar could not be loaded: {e}"));
        }
        let Some(tree) = parser.parse(content, None) else {
            return SyntaxVerdict::Invalid("parser gave up".to_string());
        };

        let root = tree.root_node();
        if !root.has_error() {
            return SyntaxVerdict::Valid;
        }
        let line = first_error_line(&root).unwrap_or(1);
        SyntaxVerdict::Invalid(format!("syntax error near line {line}"))
    }
}

fn first_error_line(node: &tree_sitter::Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .iter()
        .filter(|child| child.has_error())
        .find_map(first_error_line)
}

/// Accepts everything. For callers that only want the size checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSyntaxCheck;

impl SyntaxValidator for NoSyntaxCheck {
    fn validate(&self, _content: &str, _path: &Path) -> SyntaxVerdict {
        SyntaxVerdict::Unsupported
    }
}
