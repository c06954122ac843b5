use cj_ast::{ImportDecl, ImportKind, Node, UnsupportedSyntax};
use tracing::debug;

use super::append_lines;
use crate::error::RewriteError;
use crate::state::RewriteState;
use crate::walk::{Descend, Rule, Walker};

/// Rewrites import declarations.
///
/// ```text
/// import "m";                    require("m");
/// import a from "m";             var a = require("m");
/// import { a, b as c } from "m"; var mod$0 = require("m");
///                                var a = mod$0.a;
///                                var c = mod$0.b;
/// ```
///
/// A default import binds the loaded module value itself, not a `default`
/// property of it.
pub struct ImportRule;

impl Rule for ImportRule {
    fn name(&self) -> &'static str {
        "import"
    }

    fn test(&self, node: &Node, _path: &[&Node], _state: &RewriteState<'_>) -> bool {
        matches!(node, Node::Import(_))
    }

    fn visit<'n>(
        &self,
        _walker: &Walker,
        node: &'n Node,
        _path: &mut Vec<&'n Node>,
        state: &mut RewriteState<'_>,
    ) -> Result<Descend, RewriteError> {
        let Node::Import(decl) = node else {
            return Ok(Descend::Continue);
        };
        debug!(kind = ?decl.kind, source = %decl.source.raw, "rewriting import");

        state.cursor.catchup(decl.span.start)?;
        rewrite_import(decl, state)?;
        state.cursor.skip_to(decl.span.end)?;
        Ok(Descend::SubtreeHandled)
    }
}

fn rewrite_import(decl: &ImportDecl, state: &mut RewriteState<'_>) -> Result<(), RewriteError> {
    let load = state.options.load(&decl.source.raw);

    match decl.kind {
        ImportKind::Bare => {
            state.cursor.append(&format!("{load};"));
        }
        ImportKind::Default => {
            let specifier = decl
                .specifiers
                .first()
                .ok_or(RewriteError::MissingSpecifier { span: decl.span })?;
            state
                .cursor
                .append(&format!("var {} = {load};", specifier.local()));
        }
        ImportKind::Named => {
            let module = state.ids.generate("mod");
            state.cursor.append(&format!("var {module} = {load};\n"));
            append_lines(&mut state.cursor, &decl.specifiers, |specifier| {
                format!("var {} = {module}.{};", specifier.local(), specifier.name)
            });
        }
        ImportKind::Unrecognized => {
            return Err(UnsupportedSyntax::new(
                "ImportDeclaration",
                format!("don't know how to rewrite import at {}", decl.span),
            )
            .into());
        }
    }
    Ok(())
}
