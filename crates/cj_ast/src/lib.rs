//! Byte-range annotated module-declaration tree for cjsify.
//!
//! The rewriter never looks at the source grammar directly. A front end (the
//! swc-backed `cj_parser`, or any external parser that emits this tree as
//! JSON) hands it a [`Node`] tree where every element carries the half-open
//! byte range it occupies in the original text. Three node kinds matter:
//!
//! - `import "m"`, `import a from "m"`, `import { a, b as c } from "m"`
//! - `export ...` in all its supported shapes ([`ExportKind`])
//! - `module name from "m"`
//!
//! Everything else is an opaque [`SyntaxNode`] that only exists so nested
//! declarations can be reached.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half-open byte range `[start, end)` into the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted span {start}..{end}");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One element of the tree handed to the rewriter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    #[serde(rename = "ImportDeclaration")]
    Import(ImportDecl),
    #[serde(rename = "ExportDeclaration")]
    Export(ExportDecl),
    #[serde(rename = "ModuleDeclaration")]
    Module(ModuleDecl),
    #[serde(rename = "Syntax")]
    Syntax(SyntaxNode),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Import(decl) => decl.span,
            Node::Export(decl) => decl.span,
            Node::Module(decl) => decl.span,
            Node::Syntax(node) => node.span,
        }
    }

    /// Tag used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Import(_) => "ImportDeclaration",
            Node::Export(_) => "ExportDeclaration",
            Node::Module(_) => "ModuleDeclaration",
            Node::Syntax(node) => node.kind.type_name(),
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Import(_) | Node::Module(_) => Vec::new(),
            Node::Export(decl) => decl.kind.children(),
            Node::Syntax(node) => node.children.iter().collect(),
        }
    }
}

/// Ordinary statement and expression kinds. The rewriter never matches on
/// these; they only give nested declarations a place in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxKind {
    Program,
    Statement,
    Function,
    Class,
    Expression,
}

impl SyntaxKind {
    pub fn type_name(self) -> &'static str {
        match self {
            SyntaxKind::Program => "Program",
            SyntaxKind::Statement => "Statement",
            SyntaxKind::Function => "Function",
            SyntaxKind::Class => "Class",
            SyntaxKind::Expression => "Expression",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub span: Span,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, span: Span, children: Vec<Node>) -> Self {
        Self { kind, span, children }
    }

    pub fn leaf(kind: SyntaxKind, span: Span) -> Self {
        Self::new(kind, span, Vec::new())
    }
}

/// The quoted module path literal, carried verbatim including its quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub span: Span,
    pub raw: String,
}

/// Names one imported or exported binding.
///
/// For imports `name` is the binding in the loaded module and `alias` the
/// local binding. For exports `name` is the local (or re-exported) binding
/// and `alias` the name it is exported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Specifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The alias when present, otherwise the original name.
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import "m"`
    Bare,
    /// `import name from "m"`
    Default,
    /// `import { a, b as c } from "m"`
    Named,
    /// Any other kind a front end produced (mixed default/named imports,
    /// kinds from a newer parser). The rewriter rejects these.
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub span: Span,
    pub kind: ImportKind,
    #[serde(default)]
    pub specifiers: Vec<Specifier>,
    pub source: Source,
}

/// `module name from "m"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub span: Span,
    pub name: String,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDecl {
    pub span: Span,
    pub kind: ExportKind,
}

/// Every export shape the rewriter knows how to lower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ExportKind {
    /// `export default <init>`; `target` is `"default"` or a named property.
    DefaultAssignment { target: String, init: Box<Node> },
    /// `export default;`
    DefaultBare { target: String },
    /// `export var a = 1, b = 2;`
    Variable(ExportedVariable),
    /// `export function f() {}`, or `export default function f() {}` when
    /// `default` is set. The declaration and its binding are kept.
    Function {
        name: String,
        declaration: Box<Node>,
        #[serde(default)]
        default: bool,
    },
    /// `export class C {}`, or `export default class C {}` when `default` is
    /// set.
    Class {
        name: String,
        declaration: Box<Node>,
        #[serde(default)]
        default: bool,
    },
    /// `export * from "m"`
    ReexportAll { source: Source },
    /// `export { a, b as c } from "m"`
    ReexportNamed {
        source: Source,
        specifiers: Vec<Specifier>,
    },
    /// `export { a, b as c }`
    Named { specifiers: Vec<Specifier> },
}

impl ExportKind {
    pub fn children(&self) -> Vec<&Node> {
        match self {
            ExportKind::DefaultAssignment { init, .. } => vec![init.as_ref()],
            ExportKind::Variable(var) => var
                .declarators
                .iter()
                .filter_map(|d| d.init.as_deref())
                .collect(),
            ExportKind::Function { declaration, .. } | ExportKind::Class { declaration, .. } => {
                vec![declaration.as_ref()]
            }
            ExportKind::DefaultBare { .. }
            | ExportKind::ReexportAll { .. }
            | ExportKind::ReexportNamed { .. }
            | ExportKind::Named { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

impl std::fmt::Display for VarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedVariable {
    pub kind: VarKind,
    pub declarators: Vec<Declarator>,
}

/// One `name = init` entry of an exported variable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub span: Span,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Box<Node>>,
}

/// Syntax the rewriter or a front end has no lowering for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {node}: {detail}")]
pub struct UnsupportedSyntax {
    /// Kind of the offending node, e.g. `ImportDeclaration`.
    pub node: &'static str,
    pub detail: String,
}

impl UnsupportedSyntax {
    pub fn new(node: &'static str, detail: impl Into<String>) -> Self {
        Self {
            node,
            detail: detail.into(),
        }
    }
}

/// Feature flags for the legacy declaration forms the front end recognises
/// on its own, before handing the rest of the text to swc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSyntax {
    /// `module name from "m"`
    pub module_from: bool,
    /// `export default;`
    pub bare_default_export: bool,
}

impl Default for ModuleSyntax {
    fn default() -> Self {
        Self {
            module_from: true,
            bare_default_export: true,
        }
    }
}
