//! Parsing and printing for the AMD rewrite.
//!
//! Thin wrappers over the SWC parser and code generator:
//!
//! - [`parse_module`] picks TypeScript or ECMAScript syntax from the
//!   filename and reports syntax errors as diagnostics on stderr.
//! - [`emit_module`] prints a module, optionally with a source map;
//!   [`emit_module_with_comments`] also prints the parsed comments.

pub mod emit;
pub mod parse;

pub use emit::{emit_module, emit_module_with_comments, Emitted};
pub use parse::{parse_module, syntax_for_filename, ParseResult};
