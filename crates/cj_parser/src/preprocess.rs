//! Text-level preprocessing for declaration forms swc cannot parse.
//!
//! Runs before the swc parser. Unlike a rewriting pass it never shifts text:
//! recognised declarations are blanked in place and returned as tree nodes,
//! so offsets reported by swc for the rest of the file stay valid for the
//! original source.

use cj_ast::ModuleSyntax;

mod legacy_pass;
mod util;

pub use legacy_pass::LegacyDeclarations;

/// Blank out the legacy declarations `syntax` enables and collect them.
pub fn preprocess(source: &str, syntax: &ModuleSyntax) -> LegacyDeclarations {
    legacy_pass::extract_legacy(source, syntax)
}
