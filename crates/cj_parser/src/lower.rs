//! Lowering from the swc AST to the cjsify tree.
//!
//! Module declarations become `Import`/`Export`/`Module` nodes. Ordinary
//! statements become opaque `Statement` nodes whose children are the
//! function, arrow and class scopes nested in them, so declarations found
//! later by the preprocessor can be attached at the right depth.

use cj_ast::{
    Declarator, ExportDecl, ExportKind, ExportedVariable, ImportDecl, ImportKind, ModuleDecl,
    Node, Source, Span, Specifier, SyntaxKind, SyntaxNode, UnsupportedSyntax, VarKind,
};
use swc_common::{BytePos, Spanned};
use swc_ecma_ast as ast;
use swc_ecma_visit::{Visit, VisitWith};

const IMPORT: &str = "ImportDeclaration";
const EXPORT: &str = "ExportDeclaration";

/// Maps swc spans (offset by the source file's start position) back to
/// byte offsets into the original text.
#[derive(Clone, Copy)]
pub(crate) struct Lowerer<'a> {
    source: &'a str,
    base: BytePos,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(source: &'a str, base: BytePos) -> Self {
        Self { source, base }
    }

    pub(crate) fn lower_program(
        &self,
        module: &ast::Module,
    ) -> Result<SyntaxNode, UnsupportedSyntax> {
        let children = module
            .body
            .iter()
            .map(|item| match item {
                ast::ModuleItem::Stmt(stmt) => Ok(self.lower_stmt(stmt)),
                ast::ModuleItem::ModuleDecl(decl) => self.lower_module_decl(decl),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SyntaxNode::new(
            SyntaxKind::Program,
            Span::new(0, self.source.len()),
            children,
        ))
    }

    fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.base.0) as usize
    }

    fn span(&self, span: swc_common::Span) -> Span {
        Span::new(self.offset(span.lo), self.offset(span.hi))
    }

    fn source_literal(&self, src: &ast::Str) -> Source {
        let span = self.span(src.span);
        Source {
            span,
            raw: self
                .source
                .get(span.start..span.end)
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn scopes<N>(&self, node: &N) -> Vec<Node>
    where
        N: VisitWith<ScopeCollector<'a>> + ?Sized,
    {
        let mut collector = ScopeCollector {
            lowerer: *self,
            scopes: Vec::new(),
        };
        node.visit_with(&mut collector);
        collector.scopes
    }

    fn lower_stmt(&self, stmt: &ast::Stmt) -> Node {
        Node::Syntax(SyntaxNode::new(
            SyntaxKind::Statement,
            self.span(stmt.span()),
            self.scopes(stmt),
        ))
    }

    fn lower_body(&self, body: Option<&ast::BlockStmt>) -> Vec<Node> {
        body.map(|block| block.stmts.iter().map(|s| self.lower_stmt(s)).collect())
            .unwrap_or_default()
    }

    fn lower_function(&self, function: &ast::Function) -> Node {
        Node::Syntax(SyntaxNode::new(
            SyntaxKind::Function,
            self.span(function.span),
            self.lower_body(function.body.as_ref()),
        ))
    }

    fn lower_class(&self, class: &ast::Class) -> Node {
        let mut collector = ScopeCollector {
            lowerer: *self,
            scopes: Vec::new(),
        };
        for member in &class.body {
            member.visit_with(&mut collector);
        }
        Node::Syntax(SyntaxNode::new(
            SyntaxKind::Class,
            self.span(class.span),
            collector.scopes,
        ))
    }

    /// swc starts a class span at the `class` keyword. Decorators written
    /// between `export` and `class` are part of the exported declaration;
    /// ones written before `export` stay in the surrounding text.
    fn lower_exported_class(&self, class: &ast::Class, export_start: BytePos) -> Node {
        let mut node = self.lower_class(class);
        let first_decorator = class
            .decorators
            .iter()
            .map(|decorator| decorator.span.lo)
            .filter(|lo| *lo >= export_start)
            .min();
        if let (Some(lo), Node::Syntax(syntax)) = (first_decorator, &mut node) {
            syntax.span.start = syntax.span.start.min(self.offset(lo));
        }
        node
    }

    fn lower_expr(&self, expr: &ast::Expr) -> Node {
        Node::Syntax(SyntaxNode::new(
            SyntaxKind::Expression,
            self.span(expr.span()),
            self.scopes(expr),
        ))
    }

    fn lower_module_decl(&self, decl: &ast::ModuleDecl) -> Result<Node, UnsupportedSyntax> {
        match decl {
            ast::ModuleDecl::Import(import) => self.lower_import(import),
            ast::ModuleDecl::ExportDecl(export) => {
                let kind = match &export.decl {
                    ast::Decl::Var(var) => ExportKind::Variable(self.lower_variable(var)?),
                    ast::Decl::Fn(f) if !f.declare => ExportKind::Function {
                        name: f.ident.sym.to_string(),
                        declaration: Box::new(self.lower_function(&f.function)),
                        default: false,
                    },
                    ast::Decl::Class(c) if !c.declare => ExportKind::Class {
                        name: c.ident.sym.to_string(),
                        declaration: Box::new(
                            self.lower_exported_class(&c.class, export.span.lo),
                        ),
                        default: false,
                    },
                    other => {
                        return Err(UnsupportedSyntax::new(
                            EXPORT,
                            format!("cannot export {}", describe_decl(other)),
                        ))
                    }
                };
                Ok(self.export(export.span, kind))
            }
            ast::ModuleDecl::ExportNamed(named) => {
                if named.type_only {
                    return Err(UnsupportedSyntax::new(EXPORT, "type-only export"));
                }
                let specifiers = named
                    .specifiers
                    .iter()
                    .map(|s| self.export_specifier(s))
                    .collect::<Result<Vec<_>, _>>()?;
                let kind = match &named.src {
                    Some(src) => ExportKind::ReexportNamed {
                        source: self.source_literal(src),
                        specifiers,
                    },
                    None => ExportKind::Named { specifiers },
                };
                Ok(self.export(named.span, kind))
            }
            ast::ModuleDecl::ExportDefaultDecl(default) => {
                // A named declaration keeps its binding; only an anonymous one
                // becomes the assigned value.
                let kind = match &default.decl {
                    ast::DefaultDecl::Fn(f) => {
                        let declaration = self.lower_function(&f.function);
                        match &f.ident {
                            Some(ident) => ExportKind::Function {
                                name: ident.sym.to_string(),
                                declaration: Box::new(declaration),
                                default: true,
                            },
                            None => default_assignment(declaration),
                        }
                    }
                    ast::DefaultDecl::Class(c) => {
                        let declaration = self.lower_exported_class(&c.class, default.span.lo);
                        match &c.ident {
                            Some(ident) => ExportKind::Class {
                                name: ident.sym.to_string(),
                                declaration: Box::new(declaration),
                                default: true,
                            },
                            None => default_assignment(declaration),
                        }
                    }
                    _ => {
                        return Err(UnsupportedSyntax::new(
                            EXPORT,
                            "cannot export an interface as default",
                        ))
                    }
                };
                Ok(self.export(default.span, kind))
            }
            ast::ModuleDecl::ExportDefaultExpr(default) => {
                let init = self.lower_expr(&default.expr);
                Ok(self.export(default.span, default_assignment(init)))
            }
            ast::ModuleDecl::ExportAll(all) => {
                if all.type_only {
                    return Err(UnsupportedSyntax::new(EXPORT, "type-only export"));
                }
                let source = self.source_literal(&all.src);
                Ok(self.export(all.span, ExportKind::ReexportAll { source }))
            }
            other => Err(UnsupportedSyntax::new(
                EXPORT,
                format!("TypeScript module syntax at {}", self.span(other.span())),
            )),
        }
    }

    fn export(&self, span: swc_common::Span, kind: ExportKind) -> Node {
        Node::Export(ExportDecl {
            span: self.span(span),
            kind,
        })
    }

    fn lower_import(&self, import: &ast::ImportDecl) -> Result<Node, UnsupportedSyntax> {
        if import.type_only {
            return Err(UnsupportedSyntax::new(IMPORT, "type-only import"));
        }
        let span = self.span(import.span);
        let source = self.source_literal(&import.src);

        let kind = match import.specifiers.as_slice() {
            [] => ImportKind::Bare,
            [ast::ImportSpecifier::Namespace(namespace)] => {
                return Ok(Node::Module(ModuleDecl {
                    span,
                    name: namespace.local.sym.to_string(),
                    source,
                }));
            }
            [ast::ImportSpecifier::Default(_)] => ImportKind::Default,
            specifiers
                if specifiers
                    .iter()
                    .all(|s| matches!(s, ast::ImportSpecifier::Named(_))) =>
            {
                ImportKind::Named
            }
            _ => ImportKind::Unrecognized,
        };
        let specifiers = import
            .specifiers
            .iter()
            .map(|s| self.import_specifier(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Node::Import(ImportDecl {
            span,
            kind,
            specifiers,
            source,
        }))
    }

    fn import_specifier(
        &self,
        specifier: &ast::ImportSpecifier,
    ) -> Result<Specifier, UnsupportedSyntax> {
        match specifier {
            ast::ImportSpecifier::Named(named) => {
                if named.is_type_only {
                    return Err(UnsupportedSyntax::new(IMPORT, "type-only import specifier"));
                }
                let local = named.local.sym.to_string();
                Ok(match &named.imported {
                    Some(imported) => Specifier::aliased(export_name(IMPORT, imported)?, local),
                    None => Specifier::new(local),
                })
            }
            ast::ImportSpecifier::Default(default) => {
                Ok(Specifier::new(default.local.sym.to_string()))
            }
            ast::ImportSpecifier::Namespace(namespace) => {
                Ok(Specifier::aliased("*", namespace.local.sym.to_string()))
            }
        }
    }

    fn export_specifier(
        &self,
        specifier: &ast::ExportSpecifier,
    ) -> Result<Specifier, UnsupportedSyntax> {
        match specifier {
            ast::ExportSpecifier::Named(named) => {
                if named.is_type_only {
                    return Err(UnsupportedSyntax::new(EXPORT, "type-only export specifier"));
                }
                let name = export_name(EXPORT, &named.orig)?;
                Ok(match &named.exported {
                    Some(exported) => Specifier::aliased(name, export_name(EXPORT, exported)?),
                    None => Specifier::new(name),
                })
            }
            ast::ExportSpecifier::Namespace(_) => {
                Err(UnsupportedSyntax::new(EXPORT, "`export * as name` re-export"))
            }
            ast::ExportSpecifier::Default(_) => {
                Err(UnsupportedSyntax::new(EXPORT, "`export name from` re-export"))
            }
        }
    }

    fn lower_variable(&self, var: &ast::VarDecl) -> Result<ExportedVariable, UnsupportedSyntax> {
        if var.declare {
            return Err(UnsupportedSyntax::new(EXPORT, "ambient `declare` variable"));
        }
        let kind = match var.kind {
            ast::VarDeclKind::Var => VarKind::Var,
            ast::VarDeclKind::Let => VarKind::Let,
            ast::VarDeclKind::Const => VarKind::Const,
        };
        let declarators = var
            .decls
            .iter()
            .map(|declarator| {
                let ast::Pat::Ident(binding) = &declarator.name else {
                    return Err(UnsupportedSyntax::new(EXPORT, "destructuring export"));
                };
                Ok(Declarator {
                    span: self.span(declarator.span),
                    name: binding.id.sym.to_string(),
                    init: declarator
                        .init
                        .as_ref()
                        .map(|init| Box::new(self.lower_expr(init))),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExportedVariable { kind, declarators })
    }
}

fn default_assignment(init: Node) -> ExportKind {
    ExportKind::DefaultAssignment {
        target: "default".to_string(),
        init: Box::new(init),
    }
}

fn export_name(
    node: &'static str,
    name: &ast::ModuleExportName,
) -> Result<String, UnsupportedSyntax> {
    match name {
        ast::ModuleExportName::Ident(ident) => Ok(ident.sym.to_string()),
        _ => Err(UnsupportedSyntax::new(node, "string literal module export name")),
    }
}

fn describe_decl(decl: &ast::Decl) -> &'static str {
    match decl {
        ast::Decl::Fn(_) | ast::Decl::Class(_) => "an ambient `declare` declaration",
        ast::Decl::TsInterface(_) => "an interface",
        ast::Decl::TsTypeAlias(_) => "a type alias",
        ast::Decl::TsEnum(_) => "an enum",
        ast::Decl::TsModule(_) => "a namespace",
        ast::Decl::Using(_) => "a using declaration",
        _ => "this declaration",
    }
}

/// Collects the outermost function, arrow and class scopes below a node
/// without descending into them; each scope lowers its own body.
pub(crate) struct ScopeCollector<'a> {
    lowerer: Lowerer<'a>,
    scopes: Vec<Node>,
}

impl Visit for ScopeCollector<'_> {
    fn visit_function(&mut self, function: &ast::Function) {
        self.scopes.push(self.lowerer.lower_function(function));
    }

    fn visit_constructor(&mut self, constructor: &ast::Constructor) {
        self.scopes.push(Node::Syntax(SyntaxNode::new(
            SyntaxKind::Function,
            self.lowerer.span(constructor.span),
            self.lowerer.lower_body(constructor.body.as_ref()),
        )));
    }

    fn visit_arrow_expr(&mut self, arrow: &ast::ArrowExpr) {
        let children = match &*arrow.body {
            ast::BlockStmtOrExpr::BlockStmt(block) => self.lowerer.lower_body(Some(block)),
            ast::BlockStmtOrExpr::Expr(expr) => self.lowerer.scopes(&**expr),
        };
        self.scopes.push(Node::Syntax(SyntaxNode::new(
            SyntaxKind::Function,
            self.lowerer.span(arrow.span),
            children,
        )));
    }

    fn visit_class(&mut self, class: &ast::Class) {
        self.scopes.push(self.lowerer.lower_class(class));
    }
}

/// Insert `node` into the deepest node under `parent` whose span contains
/// it, keeping children ordered by start offset.
pub(crate) fn attach(parent: &mut SyntaxNode, node: Node) {
    let span = node.span();
    match parent
        .children
        .iter_mut()
        .find_map(|child| container_mut(child, span))
    {
        Some(container) => attach(container, node),
        None => {
            let at = parent
                .children
                .partition_point(|child| child.span().start < span.start);
            parent.children.insert(at, node);
        }
    }
}

fn container_mut(node: &mut Node, span: Span) -> Option<&mut SyntaxNode> {
    match node {
        Node::Syntax(syntax) if syntax.span.contains(span) => Some(syntax),
        Node::Export(export) if export.span.contains(span) => match &mut export.kind {
            ExportKind::DefaultAssignment { init: inner, .. }
            | ExportKind::Function {
                declaration: inner, ..
            }
            | ExportKind::Class {
                declaration: inner, ..
            } => container_mut(inner, span),
            ExportKind::Variable(var) => var
                .declarators
                .iter_mut()
                .filter_map(|d| d.init.as_deref_mut())
                .find_map(|init| container_mut(init, span)),
            _ => None,
        },
        _ => None,
    }
}
