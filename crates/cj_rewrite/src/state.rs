//! Per-rewrite state shared by every rule.

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::ids::IdGenerator;

/// How the two runtime primitives are spelled in generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteOptions {
    /// Object the module's public bindings are assigned onto.
    pub exports_object: String,
    /// Function called with the quoted module path to load a module.
    pub loader: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            exports_object: "module.exports".to_string(),
            loader: "require".to_string(),
        }
    }
}

impl RewriteOptions {
    /// `require("m")`
    pub fn load(&self, raw_source: &str) -> String {
        format!("{}({raw_source})", self.loader)
    }

    /// `module.exports.name`, or the exports object itself for `default`.
    pub fn export_target(&self, name: &str) -> String {
        match name {
            "default" => self.exports_object.clone(),
            _ => self.member(name),
        }
    }

    /// `module.exports.name`, even for `default`.
    pub fn member(&self, name: &str) -> String {
        format!("{}.{name}", self.exports_object)
    }
}

/// Cursor plus ID counter for one rewrite invocation.
///
/// Never share one between concurrent rewrites: temporary names come from
/// the counter in here.
#[derive(Debug)]
pub struct RewriteState<'src> {
    pub cursor: Cursor<'src>,
    pub ids: IdGenerator,
    pub options: RewriteOptions,
}

impl<'src> RewriteState<'src> {
    pub fn new(source: &'src str, options: RewriteOptions) -> Self {
        Self {
            cursor: Cursor::new(source),
            ids: IdGenerator::new(),
            options,
        }
    }
}
