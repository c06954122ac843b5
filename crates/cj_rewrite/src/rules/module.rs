use cj_ast::Node;
use tracing::debug;

use crate::error::RewriteError;
use crate::state::RewriteState;
use crate::walk::{Descend, Rule, Walker};

/// `module name from "m"` → `var name = require("m");`
pub struct ModuleRule;

impl Rule for ModuleRule {
    fn name(&self) -> &'static str {
        "module"
    }

    fn test(&self, node: &Node, _path: &[&Node], _state: &RewriteState<'_>) -> bool {
        matches!(node, Node::Module(_))
    }

    fn visit<'n>(
        &self,
        _walker: &Walker,
        node: &'n Node,
        _path: &mut Vec<&'n Node>,
        state: &mut RewriteState<'_>,
    ) -> Result<Descend, RewriteError> {
        let Node::Module(decl) = node else {
            return Ok(Descend::Continue);
        };
        debug!(name = %decl.name, source = %decl.source.raw, "rewriting module declaration");

        state.cursor.catchup(decl.span.start)?;
        let statement = format!("var {} = {};", decl.name, state.options.load(&decl.source.raw));
        state.cursor.append(&statement);
        state.cursor.skip_to(decl.span.end)?;
        Ok(Descend::SubtreeHandled)
    }
}
