//! Call-shape matchers.
//!
//! `require("y")` → [`CallShape::Require`] when `require` is free at the call
//! site and the single argument is a string literal.
//! `define(...)`  → [`CallShape::Define`] regardless of arguments.

use swc_ecma_ast as ast;

use crate::scope::BindingLookup;

/// What a call expression looks like to the rewrite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallShape<'a> {
    /// `require("<source>")` with an unshadowed `require`.
    Require(&'a ast::Str),
    /// `define(...)`, any arguments.
    Define,
    /// Anything else; left untouched.
    Other,
}

/// Classify a call expression.
pub fn classify_call<'a>(call: &'a ast::CallExpr, scope: &impl BindingLookup) -> CallShape<'a> {
    match callee_name(call) {
        Some("require") => match require_argument(call) {
            Some(source) if !scope.has_binding("require") => CallShape::Require(source),
            _ => CallShape::Other,
        },
        Some("define") => CallShape::Define,
        _ => CallShape::Other,
    }
}

/// The dependency string of a valid `require("...")` call.
pub fn require_source<'a>(
    call: &'a ast::CallExpr,
    scope: &impl BindingLookup,
) -> Option<&'a ast::Str> {
    match classify_call(call, scope) {
        CallShape::Require(source) => Some(source),
        CallShape::Define | CallShape::Other => None,
    }
}

pub fn is_require_call(call: &ast::CallExpr, scope: &impl BindingLookup) -> bool {
    require_source(call, scope).is_some()
}

/// Same as [`require_source`] for an arbitrary expression.
pub fn require_source_of_expr<'a>(
    expr: &'a ast::Expr,
    scope: &impl BindingLookup,
) -> Option<&'a ast::Str> {
    match expr {
        ast::Expr::Call(call) => require_source(call, scope),
        _ => None,
    }
}

pub fn is_define_call(call: &ast::CallExpr) -> bool {
    callee_name(call) == Some("define")
}

/// `define(...)` as a whole expression statement.
pub fn is_define_stmt(stmt: &ast::Stmt) -> bool {
    match stmt {
        ast::Stmt::Expr(ast::ExprStmt { expr, .. }) => match &**expr {
            ast::Expr::Call(call) => is_define_call(call),
            _ => false,
        },
        _ => false,
    }
}

fn callee_name(call: &ast::CallExpr) -> Option<&str> {
    match &call.callee {
        ast::Callee::Expr(expr) => match &**expr {
            ast::Expr::Ident(ident) => Some(&*ident.sym),
            _ => None,
        },
        ast::Callee::Super(_) | ast::Callee::Import(_) => None,
    }
}

fn require_argument(call: &ast::CallExpr) -> Option<&ast::Str> {
    let [arg] = call.args.as_slice() else {
        return None;
    };
    if arg.spread.is_some() {
        return None;
    }
    match &*arg.expr {
        ast::Expr::Lit(ast::Lit::Str(s)) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeStack;
    use std::collections::HashSet;

    fn first_call(src: &str) -> ast::CallExpr {
        let parsed = amd_parser::parse_module(src, "input.js").unwrap();
        match parsed.module.body.into_iter().next() {
            Some(ast::ModuleItem::Stmt(ast::Stmt::Expr(stmt))) => match *stmt.expr {
                ast::Expr::Call(call) => call,
                other => panic!("expected a call, got {other:?}"),
            },
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn require_with_one_string_literal() {
        let scope = ScopeStack::new();
        let call = first_call("require(\"fs\");");
        let source = require_source(&call, &scope).unwrap();
        assert_eq!(amd_ast::str_value(source), "fs");
    }

    #[test]
    fn require_shapes_that_do_not_match() {
        let scope = ScopeStack::new();
        for src in [
            "require();",
            "require(\"a\", \"b\");",
            "require(name);",
            "require(`fs`);",
            "require(...deps);",
            "obj.require(\"fs\");",
            "requireJs(\"fs\");",
        ] {
            let call = first_call(src);
            assert_eq!(classify_call(&call, &scope), CallShape::Other, "{src}");
        }
    }

    #[test]
    fn shadowed_require_is_not_a_dependency() {
        let mut scope = ScopeStack::new();
        scope.push(HashSet::from(["require".to_string()]));
        let call = first_call("require(\"fs\");");
        assert!(!is_require_call(&call, &scope));
    }

    #[test]
    fn define_matches_any_arguments() {
        assert!(is_define_call(&first_call("define();")));
        assert!(is_define_call(&first_call(
            "define([\"a\"], function (a) {});"
        )));
        assert!(!is_define_call(&first_call("window.define();")));
    }
}
