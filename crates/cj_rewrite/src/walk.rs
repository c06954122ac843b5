//! Depth-first traversal that hands declaration nodes to their rules.

use cj_ast::Node;
use tracing::trace;

use crate::error::RewriteError;
use crate::rules::{ExportRule, ImportRule, ModuleRule};
use crate::state::RewriteState;

/// What the walker does after a rule returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    /// Visit the node's children as usual.
    Continue,
    /// The rule consumed the node, recursing itself where it had to.
    SubtreeHandled,
}

/// A transformation registered with the [`Walker`].
pub trait Rule {
    fn name(&self) -> &'static str;

    /// Whether this rule handles `node`. `path` holds its ancestors,
    /// outermost first.
    fn test(&self, node: &Node, path: &[&Node], state: &RewriteState<'_>) -> bool;

    fn visit<'n>(
        &self,
        walker: &Walker,
        node: &'n Node,
        path: &mut Vec<&'n Node>,
        state: &mut RewriteState<'_>,
    ) -> Result<Descend, RewriteError>;
}

/// Single-threaded pre-order walk over a tree. For each node the first
/// registered rule whose `test` matches is invoked.
pub struct Walker {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for Walker {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ImportRule),
            Box::new(ModuleRule),
            Box::new(ExportRule),
        ])
    }
}

impl Walker {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Walk `node` and everything below it.
    pub fn walk<'n>(
        &self,
        node: &'n Node,
        path: &mut Vec<&'n Node>,
        state: &mut RewriteState<'_>,
    ) -> Result<(), RewriteError> {
        let rule = self.rules.iter().find(|rule| rule.test(node, path, state));
        let descend = match rule {
            Some(rule) => {
                trace!(rule = rule.name(), node = node.type_name(), span = %node.span(), "dispatch");
                rule.visit(self, node, path, state)?
            }
            None => Descend::Continue,
        };
        if descend == Descend::Continue {
            self.walk_children(node, path, state)?;
        }
        Ok(())
    }

    /// Walk every child of `node` with `node` pushed onto the path.
    pub fn walk_children<'n>(
        &self,
        node: &'n Node,
        path: &mut Vec<&'n Node>,
        state: &mut RewriteState<'_>,
    ) -> Result<(), RewriteError> {
        path.push(node);
        let result = node
            .children()
            .into_iter()
            .try_for_each(|child| self.walk(child, path, state));
        path.pop();
        result
    }

    /// Walk `child`, a node held by `parent` outside the ordinary child
    /// list handling, with `parent` on the path.
    pub fn walk_nested<'n>(
        &self,
        parent: &'n Node,
        child: &'n Node,
        path: &mut Vec<&'n Node>,
        state: &mut RewriteState<'_>,
    ) -> Result<(), RewriteError> {
        path.push(parent);
        let result = self.walk(child, path, state);
        path.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use cj_ast::{Span, SyntaxKind, SyntaxNode};

    use super::*;
    use crate::state::RewriteOptions;

    type Seen = Rc<RefCell<Vec<(Span, usize)>>>;

    /// Records every statement it sees along with its depth.
    struct Recorder {
        seen: Seen,
        handled: Descend,
    }

    impl Rule for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn test(&self, node: &Node, _path: &[&Node], _state: &RewriteState<'_>) -> bool {
            matches!(node, Node::Syntax(s) if s.kind == SyntaxKind::Statement)
        }

        fn visit<'n>(
            &self,
            _walker: &Walker,
            node: &'n Node,
            path: &mut Vec<&'n Node>,
            _state: &mut RewriteState<'_>,
        ) -> Result<Descend, RewriteError> {
            self.seen.borrow_mut().push((node.span(), path.len()));
            Ok(self.handled)
        }
    }

    fn statement(start: usize, end: usize, children: Vec<Node>) -> Node {
        Node::Syntax(SyntaxNode::new(
            SyntaxKind::Statement,
            Span::new(start, end),
            children,
        ))
    }

    fn tree() -> Node {
        let inner = statement(2, 4, vec![]);
        let function = Node::Syntax(SyntaxNode::new(
            SyntaxKind::Function,
            Span::new(1, 5),
            vec![inner],
        ));
        Node::Syntax(SyntaxNode::new(
            SyntaxKind::Program,
            Span::new(0, 8),
            vec![statement(0, 6, vec![function]), statement(6, 8, vec![])],
        ))
    }

    fn run(handled: Descend) -> Vec<(Span, usize)> {
        let seen = Seen::default();
        let walker = Walker::new(vec![Box::new(Recorder {
            seen: seen.clone(),
            handled,
        })]);
        let mut state = RewriteState::new("01234567", RewriteOptions::default());
        let program = tree();
        walker.walk(&program, &mut Vec::new(), &mut state).unwrap();
        let result = seen.borrow().clone();
        result
    }

    #[test]
    fn continue_descends_into_children() {
        assert_eq!(
            run(Descend::Continue),
            vec![(Span::new(0, 6), 1), (Span::new(2, 4), 3), (Span::new(6, 8), 1)]
        );
    }

    #[test]
    fn subtree_handled_stops_descent() {
        assert_eq!(
            run(Descend::SubtreeHandled),
            vec![(Span::new(0, 6), 1), (Span::new(6, 8), 1)]
        );
    }
}
