//! ECMAScript/TypeScript front end for cjsify.
//!
//! Produces the byte-range annotated tree `cj_rewrite` consumes:
//!
//! 1. Preprocess: blank out `module x from "m"` and `export default;`,
//!    which swc cannot parse, keeping them as ready tree nodes.
//! 2. Parse: feed the blanked text to the standard swc parser.
//! 3. Lower: map swc module declarations onto `cj_ast` nodes and attach the
//!    preprocessed ones where they belong.

mod lower;
pub mod parse;
pub mod preprocess;

pub use parse::{parse_module, ParseResult};
