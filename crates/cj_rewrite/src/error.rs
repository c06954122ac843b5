//! Errors raised while rewriting a module.

use cj_ast::{Span, UnsupportedSyntax};
use thiserror::Error;

/// Why a module could not be rewritten.
///
/// Every variant aborts the whole rewrite; no partial output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error(transparent)]
    UnsupportedSyntax(#[from] UnsupportedSyntax),

    /// `import name from "m"` without a specifier for `name`.
    #[error("default import at {span} has no specifier")]
    MissingSpecifier { span: Span },

    /// A rule asked the cursor to move backwards.
    #[error("cursor cannot move back from byte {position} to byte {requested}")]
    CursorRegression { position: usize, requested: usize },

    /// A rule asked for an offset past the end of the source or inside a
    /// multibyte character.
    #[error("offset {offset} is not a valid position in a source of {len} bytes")]
    OffsetOutOfBounds { offset: usize, len: usize },
}
