use cj_ast::{
    ExportDecl, ExportKind, ExportedVariable, Node, Source, Specifier, SyntaxKind, SyntaxNode,
    UnsupportedSyntax,
};
use tracing::debug;

use super::append_lines;
use crate::error::RewriteError;
use crate::state::RewriteState;
use crate::walk::{Descend, Rule, Walker};

/// Rewrites export declarations.
///
/// ```text
/// export default 42;              module.exports = 42;
/// export default;                 module.exports = undefined;
/// export var a = 1;               var a = module.exports.a = 1;
/// export function f() {}          function f() {}
///                                 module.exports.f = f;
/// export default class C {}       class C {}
///                                 module.exports = C;
/// export default function () {}   module.exports = function () {};
/// export * from "m";              var mod$0 = require("m");
///                                 for (var key$1 in mod$0) module.exports[key$1] = mod$0[key$1];
/// export { a, b as c } from "m";  var mod$0 = require("m");
///                                 module.exports.a = mod$0.a;
///                                 module.exports.c = mod$0.b;
/// export { a, b as c };           module.exports.a = a;
///                                 module.exports.c = b;
/// ```
///
/// Initializers and exported declarations are kept verbatim and walked, so
/// declarations nested inside them are rewritten too.
pub struct ExportRule;

impl Rule for ExportRule {
    fn name(&self) -> &'static str {
        "export"
    }

    fn test(&self, node: &Node, _path: &[&Node], _state: &RewriteState<'_>) -> bool {
        matches!(node, Node::Export(_))
    }

    fn visit<'n>(
        &self,
        walker: &Walker,
        node: &'n Node,
        path: &mut Vec<&'n Node>,
        state: &mut RewriteState<'_>,
    ) -> Result<Descend, RewriteError> {
        let Node::Export(decl) = node else {
            return Ok(Descend::Continue);
        };
        debug!(span = %decl.span, "rewriting export");

        state.cursor.catchup(decl.span.start)?;
        match &decl.kind {
            ExportKind::DefaultAssignment { target, init } => {
                let target = state.options.export_target(target);
                state.cursor.append(&format!("{target} = "));
                state.cursor.skip_to(init.span().start)?;
                walker.walk_nested(node, init, path, state)?;
                state.cursor.catchup(init.span().end)?;
                if is_declaration(init) && init.span().end == decl.span.end {
                    state.cursor.append(";");
                }
            }
            ExportKind::DefaultBare { target } => {
                let target = state.options.export_target(target);
                state.cursor.append(&format!("{target} = undefined;"));
                state.cursor.skip_to(decl.span.end)?;
            }
            ExportKind::Variable(var) => {
                rewrite_variable(walker, node, var, path, state)?;
            }
            ExportKind::Function {
                name,
                declaration,
                default,
            }
            | ExportKind::Class {
                name,
                declaration,
                default,
            } => {
                let span = declaration.span();
                state.cursor.skip_to(span.start)?;
                walker.walk_nested(node, declaration, path, state)?;
                state.cursor.catchup(span.end)?;
                let target = if *default {
                    state.options.export_target("default")
                } else {
                    state.options.member(name)
                };
                state.cursor.append(&format!("\n{target} = {name};"));
                state.cursor.skip_to(decl.span.end)?;
            }
            ExportKind::ReexportAll { source } => {
                let module = load_into_temporary(source, state);
                let key = state.ids.generate("key");
                let exports = &state.options.exports_object;
                let statement = format!(
                    "for (var {key} in {module}) {exports}[{key}] = {module}[{key}];"
                );
                state.cursor.append(&statement);
                state.cursor.skip_to(decl.span.end)?;
            }
            ExportKind::ReexportNamed { source, specifiers } => {
                let module = load_into_temporary(source, state);
                reexport(decl, specifiers, state, |name| format!("{module}.{name}"))?;
            }
            ExportKind::Named { specifiers } => {
                reexport(decl, specifiers, state, str::to_string)?;
            }
        }
        Ok(Descend::SubtreeHandled)
    }
}

/// An anonymous `function`/`class` declaration used as the default value.
/// It carries no `;` of its own once it becomes an assignment.
fn is_declaration(init: &Node) -> bool {
    matches!(
        init,
        Node::Syntax(SyntaxNode {
            kind: SyntaxKind::Function | SyntaxKind::Class,
            ..
        })
    )
}

/// Emit `var mod$N = require("m");\n` and return the temporary's name.
fn load_into_temporary(source: &Source, state: &mut RewriteState<'_>) -> String {
    let module = state.ids.generate("mod");
    let load = state.options.load(&source.raw);
    state.cursor.append(&format!("var {module} = {load};\n"));
    module
}

/// One `module.exports.<local> = <value of name>;` line per specifier.
fn reexport<F>(
    decl: &ExportDecl,
    specifiers: &[Specifier],
    state: &mut RewriteState<'_>,
    value: F,
) -> Result<(), RewriteError>
where
    F: Fn(&str) -> String,
{
    let options = &state.options;
    append_lines(&mut state.cursor, specifiers, |specifier| {
        format!(
            "{} = {};",
            options.member(specifier.local()),
            value(&specifier.name)
        )
    });
    state.cursor.skip_to(decl.span.end)
}

/// `export let a = 1, b;` → `let a = module.exports.a = 1, b = module.exports.b = undefined;`
///
/// The text between declarators and after the last one is copied through,
/// so separators, comments and the closing semicolon survive.
fn rewrite_variable<'n>(
    walker: &Walker,
    node: &'n Node,
    var: &'n ExportedVariable,
    path: &mut Vec<&'n Node>,
    state: &mut RewriteState<'_>,
) -> Result<(), RewriteError> {
    if var.declarators.is_empty() {
        let detail = "variable export without declarators";
        return Err(UnsupportedSyntax::new("ExportDeclaration", detail).into());
    }
    for (i, declarator) in var.declarators.iter().enumerate() {
        if i == 0 {
            state.cursor.skip_to(declarator.span.start)?;
            state.cursor.append(&format!("{} ", var.kind));
        } else {
            state.cursor.catchup(declarator.span.start)?;
        }

        let name = &declarator.name;
        let target = state.options.member(name);
        state.cursor.append(&format!("{name} = {target} = "));
        match &declarator.init {
            Some(init) => {
                state.cursor.skip_to(init.span().start)?;
                walker.walk_nested(node, init, path, state)?;
                state.cursor.catchup(init.span().end)?;
            }
            None => {
                state.cursor.append("undefined");
                state.cursor.skip_to(declarator.span.end)?;
            }
        }
    }
    Ok(())
}
