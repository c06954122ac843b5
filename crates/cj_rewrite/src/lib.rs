//! Rewrites module declarations into `require` calls and exports-object
//! assignments.
//!
//! Given the original source and a byte-range annotated tree of it, the
//! rewriter produces text identical to the input except inside the spans of
//! module declarations:
//!
//! - `import a from "m"`         → `var a = require("m");`
//! - `import { a } from "m"`     → `var mod$0 = require("m");\nvar a = mod$0.a;`
//! - `module m from "m"`         → `var m = require("m");`
//! - `export var a = 1`          → `var a = module.exports.a = 1`
//! - `export * from "m"`         → a `for ... in` copy onto `module.exports`
//!
//! Parsing is not done here; see `cj_parser` for the swc-backed front end.

pub mod cursor;
pub mod error;
pub mod ids;
pub mod rules;
pub mod state;
pub mod walk;


use cj_ast::Node;

pub use cursor::Cursor;
pub use error::RewriteError;
pub use ids::IdGenerator;
pub use state::{RewriteOptions, RewriteState};
pub use walk::{Descend, Rule, Walker};

/// Rewrite every module declaration in `program`, a tree of `source`.
///
/// Temporary names start from `mod$0` on every call.
pub fn rewrite_module(
    source: &str,
    program: &Node,
    options: &RewriteOptions,
) -> Result<String, RewriteError> {
    Rewriter::new(options.clone()).rewrite(source, program)
}

/// A reusable rewriter holding the options and registered rules.
///
/// Each [`Rewriter::rewrite`] call gets its own [`RewriteState`], so one
/// rewriter can serve many files, and rewriting a file twice yields the same
/// temporary names both times.
pub struct Rewriter {
    walker: Walker,
    options: RewriteOptions,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new(RewriteOptions::default())
    }
}

impl Rewriter {
    pub fn new(options: RewriteOptions) -> Self {
        Self {
            walker: Walker::default(),
            options,
        }
    }

    /// Use a custom rule set instead of the import/module/export rules.
    pub fn with_walker(options: RewriteOptions, walker: Walker) -> Self {
        Self { walker, options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    pub fn rewrite(&self, source: &str, program: &Node) -> Result<String, RewriteError> {
        let mut state = RewriteState::new(source, self.options.clone());
        self.rewrite_with(program, &mut state)?;
        state.cursor.finalize()
    }

    /// Walk `program` with a caller-owned state without finalizing it.
    ///
    /// The caller is responsible for calling `state.ids.reset()` between
    /// unrelated runs if it wants reproducible temporary names.
    pub fn rewrite_with(
        &self,
        program: &Node,
        state: &mut RewriteState<'_>,
    ) -> Result<(), RewriteError> {
        self.walker.walk(program, &mut Vec::new(), state)
    }
}
