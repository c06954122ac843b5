//! Rules for the three module declaration kinds.
//!
//! Each rule flushes the source up to its declaration, drops the
//! declaration's text, and appends the replacement built from two runtime
//! primitives: a loader call (`require("m")`) and an assignment onto the
//! exports object (`module.exports.name = ...`).

mod export;
mod import;
mod module;

pub use export::ExportRule;
pub use import::ImportRule;
pub use module::ModuleRule;

use cj_ast::Specifier;

use crate::cursor::Cursor;

/// Append one statement per specifier, newline separated, with no trailing
/// separator after the last one.
pub(crate) fn append_lines<F>(cursor: &mut Cursor<'_>, specifiers: &[Specifier], mut line: F)
where
    F: FnMut(&Specifier) -> String,
{
    for (i, specifier) in specifiers.iter().enumerate() {
        if i > 0 {
            cursor.append("\n");
        }
        cursor.append(&line(specifier));
    }
}
