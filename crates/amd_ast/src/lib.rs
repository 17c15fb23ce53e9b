//! ECMAScript AST plus the data model of the AMD rewrite.
//!
//! Re-exports the standard SWC AST and adds the records the rewrite
//! collects while it walks a module:
//! - [`NamedDependency`]: `const x = require("y")`, becomes a factory parameter
//! - [`BareDependency`]: `require("y");`, a side-effect-only dependency
//! - [`ModuleFlags`]: what the classifier and collector learned about a module
//! - [`AmdOptions`]: naming and lowering configuration

pub use swc_ecma_ast::*;

use serde::{Deserialize, Serialize};

/// String value of a string literal, lossily converted from WTF-8.
pub fn str_value(lit: &Str) -> String {
    lit.value.to_atom_lossy().to_string()
}

/// A dependency bound to an identifier, e.g. `const fs = require("fs")`.
///
/// `param` is always a plain identifier pattern; destructuring declarators
/// are never recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDependency {
    pub param: BindingIdent,
    pub source: Str,
}

impl NamedDependency {
    pub fn source_value(&self) -> String {
        str_value(&self.source)
    }

    pub fn param_name(&self) -> &str {
        &self.param.id.sym
    }
}

/// A dependency required only for its side effect: `require("y");`.
#[derive(Debug, Clone, PartialEq)]
pub struct BareDependency {
    pub source: Str,
}

impl BareDependency {
    pub fn source_value(&self) -> String {
        str_value(&self.source)
    }
}

/// Per-module facts gathered before and during the rewrite.
///
/// `has_exports` and `has_module` are informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFlags {
    /// A `define(...)` call was found; the module is left alone.
    pub has_define: bool,
    /// A top-level `export default` exists; the factory returns `exports.default`.
    pub has_default: bool,
    /// A free reference to `exports` occurs.
    pub has_exports: bool,
    /// A free reference to `module` occurs.
    pub has_module: bool,
}

/// Options controlling module naming and the ES module lowering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmdOptions {
    /// Emit a module name as the first `define` argument.
    pub module_ids: bool,
    /// Explicit module name; takes precedence over the derived one.
    pub module_id: Option<String>,
    /// Prefix joined with `/` in front of derived names.
    pub module_root: Option<String>,
    /// Stripped from the start of the filename before deriving a name.
    pub source_root: Option<String>,
    /// Keep the file extension in derived names.
    pub keep_module_id_extensions: bool,
    /// Lower `import`/`export` to `require`/`exports` before wrapping.
    pub lower_esm: bool,
    /// Insert a `"use strict"` directive while lowering.
    pub strict_mode: bool,
    /// Emit `Object.defineProperty(exports, "__esModule", ...)` for ES modules.
    pub es_module_marker: bool,
}

impl Default for AmdOptions {
    fn default() -> Self {
        Self {
            module_ids: false,
            module_id: None,
            module_root: None,
            source_root: None,
            keep_module_id_extensions: false,
            lower_esm: true,
            strict_mode: false,
            es_module_marker: false,
        }
    }
}
