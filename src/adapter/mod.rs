//! Syntax Tree Adapter
//!
//! Wraps the tree-sitter parser behind a uniform, owned tree interface.
//! Nothing past this module touches tree-sitter types.

pub mod tree;

pub use tree::{Point, SourceRange, SyntaxId, SyntaxNode, SyntaxTree};

use crate::rules::{self, LanguageRules};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tree_sitter::Parser;

/// Source languages the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
        }
    }

    pub fn all() -> &'static [Language] {
        &[Language::Python, Language::Java]
    }

    /// File extensions handled by this language
    pub fn file_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::Java => &["java"],
        }
    }

    /// Guess the language from a file extension
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.file_extensions().contains(&ext))
    }

    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    /// The rule set driving graph construction for this language
    pub fn rules(&self) -> &'static dyn LanguageRules {
        rules::for_language(*self)
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "python" | "py" | "python3" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            _ => Err(Error::InvalidArgument(format!("Unknown language: {}", s))),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse source text into an owned syntax tree.
///
/// A tree containing ERROR or MISSING nodes is still returned; the caller's
/// error policy decides what to do with [`SyntaxTree::malformed`] regions.
pub fn parse(source: &str, language: Language) -> Result<SyntaxTree> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| Error::Adapter(format!("Failed to load {} grammar: {}", language, e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::Adapter(format!("Failed to parse {} source", language)))?;

    Ok(SyntaxTree::from_tree_sitter(&tree, source))
}
