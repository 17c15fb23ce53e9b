//! Module classifier: is the module already AMD, does it export a default?

use amd_ast::ModuleFlags;
use swc_ecma_ast as ast;
use swc_ecma_visit::{Visit, VisitWith};

use crate::matchers::{is_define_call, is_define_stmt};
use crate::util::directive_count;

/// Why a module was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The first statement is a `define(...)` call.
    AlreadyWrapped,
    /// A `define(...)` call appears somewhere else in the module.
    DefineCall,
    /// This transform instance already rewrote a module.
    AlreadyRan,
}

/// Entry-phase classification, run before anything mutates the module.
///
/// Returns the skip reason when the module must be left alone; otherwise
/// records `has_default` in `flags`.
pub fn classify_entry(module: &ast::Module, flags: &mut ModuleFlags) -> Option<SkipReason> {
    let first = module.body.get(directive_count(&module.body));
    if let Some(ast::ModuleItem::Stmt(stmt)) = first {
        if is_define_stmt(stmt) {
            flags.has_define = true;
            return Some(SkipReason::AlreadyWrapped);
        }
    }

    if contains_define_call(module) {
        flags.has_define = true;
        return Some(SkipReason::DefineCall);
    }

    flags.has_default = has_default_export(&module.body);
    None
}

/// Whether a top-level `export default` item exists.
pub fn has_default_export(body: &[ast::ModuleItem]) -> bool {
    body.iter().any(|item| {
        matches!(
            item,
            ast::ModuleItem::ModuleDecl(
                ast::ModuleDecl::ExportDefaultDecl(_) | ast::ModuleDecl::ExportDefaultExpr(_)
            )
        )
    })
}

/// Whether any `define(...)` call occurs anywhere in the module, nested
/// functions included.
pub fn contains_define_call(module: &ast::Module) -> bool {
    let mut hunter = DefineHunter { found: false };
    module.visit_with(&mut hunter);
    hunter.found
}

struct DefineHunter {
    found: bool,
}

impl Visit for DefineHunter {
    fn visit_call_expr(&mut self, n: &ast::CallExpr) {
        if is_define_call(n) {
            self.found = true;
            return;
        }
        n.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(src: &str) -> (Option<SkipReason>, ModuleFlags) {
        let parsed = amd_parser::parse_module(src, "input.js").unwrap();
        let mut flags = ModuleFlags::default();
        let skip = classify_entry(&parsed.module, &mut flags);
        (skip, flags)
    }

    #[test]
    fn leading_define_is_already_wrapped() {
        let (skip, flags) = classify("define([\"a\"], function (a) {});");
        assert_eq!(skip, Some(SkipReason::AlreadyWrapped));
        assert!(flags.has_define);
    }

    #[test]
    fn directives_do_not_hide_a_leading_define() {
        let (skip, _) = classify("\"use strict\";\ndefine(function () {});");
        assert_eq!(skip, Some(SkipReason::AlreadyWrapped));
    }

    #[test]
    fn nested_define_call_also_skips() {
        let (skip, flags) =
            classify("const a = require(\"a\");\nfunction f() { if (x) { define(a); } }");
        assert_eq!(skip, Some(SkipReason::DefineCall));
        assert!(flags.has_define);
    }

    #[test]
    fn default_export_forms() {
        assert!(classify("export default function main() {}").1.has_default);
        assert!(classify("export default class {}").1.has_default);
        assert!(classify("export default 42;").1.has_default);
        assert!(!classify("export const a = 1;").1.has_default);
        assert!(!classify("exports.default = 1;").1.has_default);
    }

    #[test]
    fn empty_module_is_not_skipped() {
        let (skip, flags) = classify("");
        assert_eq!(skip, None);
        assert_eq!(flags, ModuleFlags::default());
    }
}
