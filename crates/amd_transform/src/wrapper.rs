//! Wrapper builder.
//!
//! ```text
//! "use strict"; <body>
//! ```
//! becomes
//! ```text
//! define(<name>?, [<sources>], function (<params>) {
//!     "use strict";
//!     var exports = {};
//!     <body>
//!     return exports;            // or exports.default
//! });
//! ```

use amd_ast::ModuleFlags;
use swc_common::DUMMY_SP;
use swc_ecma_ast as ast;

use crate::collect::Dependencies;
use crate::util::{
    call, directive_count, exports_member, expr_stmt, fn_expr, ident_expr, str_lit, var_stmt,
};

/// Everything needed to print the `define(...)` call.
#[derive(Debug, Clone)]
pub struct AmdWrapper {
    pub module_name: Option<ast::Str>,
    pub sources: Vec<ast::Str>,
    pub params: Vec<ast::Param>,
    /// Factory body, directives and `var exports = {}` included.
    pub body: Vec<ast::Stmt>,
}

impl AmdWrapper {
    /// Assemble the wrapper parts from a collected module body.
    pub fn new(
        body: Vec<ast::ModuleItem>,
        deps: &Dependencies,
        flags: &ModuleFlags,
        module_name: Option<String>,
    ) -> Self {
        let mut directives = body;
        let rest = directives.split_off(directive_count(&directives));

        let mut stmts = Vec::with_capacity(directives.len() + rest.len() + 2);
        stmts.extend(directives.into_iter().filter_map(into_stmt));
        stmts.push(var_stmt(
            "exports",
            Box::new(ast::Expr::Object(ast::ObjectLit {
                span: DUMMY_SP,
                props: vec![],
            })),
        ));
        stmts.extend(rest.into_iter().filter_map(into_stmt));
        stmts.push(ast::Stmt::Return(ast::ReturnStmt {
            span: DUMMY_SP,
            arg: Some(return_value(flags)),
        }));

        Self {
            module_name: module_name.as_deref().map(str_lit),
            sources: deps.sources(),
            params: deps.params(),
            body: stmts,
        }
    }

    /// `function (<params>) { <body> }`
    fn factory(&self) -> ast::Expr {
        fn_expr(self.params.clone(), self.body.clone())
    }

    /// The replacement module body: a single `define(...)` statement.
    pub fn into_items(self) -> Vec<ast::ModuleItem> {
        let factory = self.factory();
        let mut args = Vec::with_capacity(3);
        if let Some(name) = self.module_name {
            args.push(Box::new(ast::Expr::Lit(ast::Lit::Str(name))));
        }
        args.push(Box::new(ast::Expr::Array(ast::ArrayLit {
            span: DUMMY_SP,
            elems: self
                .sources
                .into_iter()
                .map(|source| {
                    Some(ast::ExprOrSpread {
                        spread: None,
                        expr: Box::new(ast::Expr::Lit(ast::Lit::Str(source))),
                    })
                })
                .collect(),
        })));
        args.push(Box::new(factory));

        vec![ast::ModuleItem::Stmt(expr_stmt(call(ident_expr("define"), args)))]
    }
}

/// Build the replacement body for a module in one step.
pub fn build_wrapper(
    body: Vec<ast::ModuleItem>,
    deps: &Dependencies,
    flags: &ModuleFlags,
    module_name: Option<String>,
) -> Vec<ast::ModuleItem> {
    AmdWrapper::new(body, deps, flags, module_name).into_items()
}

/// `exports.default` for modules with a default export, `exports` otherwise.
fn return_value(flags: &ModuleFlags) -> Box<ast::Expr> {
    if flags.has_default {
        Box::new(ast::Expr::Member(exports_member("default")))
    } else {
        ident_expr("exports")
    }
}

fn into_stmt(item: ast::ModuleItem) -> Option<ast::Stmt> {
    match item {
        ast::ModuleItem::Stmt(stmt) => Some(stmt),
        ast::ModuleItem::ModuleDecl(decl) => {
            tracing::warn!(?decl, "module declaration cannot move into an AMD factory; dropped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::directive;

    fn deps(named: &[(&str, &str)], bare: &[&str]) -> Dependencies {
        let mut deps = Dependencies::default();
        for (param, source) in named {
            deps.push_named(amd_ast::NamedDependency {
                param: crate::util::ident(param).into(),
                source: str_lit(source),
            });
        }
        for source in bare {
            deps.push_bare(amd_ast::BareDependency {
                source: str_lit(source),
            });
        }
        deps
    }

    #[test]
    fn directives_move_into_the_factory() {
        let body = vec![
            ast::ModuleItem::Stmt(directive("use strict")),
            ast::ModuleItem::Stmt(var_stmt("a", ident_expr("b"))),
        ];
        let wrapper = AmdWrapper::new(body, &deps(&[], &[]), &ModuleFlags::default(), None);
        assert_eq!(wrapper.body.len(), 4);
        assert!(matches!(
            &wrapper.body[0],
            ast::Stmt::Expr(ast::ExprStmt { expr, .. }) if matches!(&**expr, ast::Expr::Lit(ast::Lit::Str(_)))
        ));
        assert!(matches!(&wrapper.body[1], ast::Stmt::Decl(ast::Decl::Var(_))));
        assert!(matches!(&wrapper.body[3], ast::Stmt::Return(_)));
    }

    #[test]
    fn define_arguments_with_and_without_name() {
        let d = deps(&[("fs", "fs")], &["polyfill"]);
        let flags = ModuleFlags::default();

        let items = build_wrapper(vec![], &d, &flags, None);
        let args = define_args(&items);
        assert_eq!(args.len(), 2);

        let items = build_wrapper(vec![], &d, &flags, Some("app/main".into()));
        let args = define_args(&items);
        assert_eq!(args.len(), 3);
        match &*args[0].expr {
            ast::Expr::Lit(ast::Lit::Str(s)) => assert_eq!(amd_ast::str_value(s), "app/main"),
            other => panic!("expected module name literal, got {other:?}"),
        }
        match &*args[1].expr {
            ast::Expr::Array(a) => assert_eq!(a.elems.len(), 2),
            other => panic!("expected dependency array, got {other:?}"),
        }
    }

    #[test]
    fn default_export_returns_exports_default() {
        let flags = ModuleFlags {
            has_default: true,
            ..Default::default()
        };
        let wrapper = AmdWrapper::new(vec![], &deps(&[], &[]), &flags, None);
        match wrapper.body.last() {
            Some(ast::Stmt::Return(ret)) => {
                assert!(matches!(ret.arg.as_deref(), Some(ast::Expr::Member(_))))
            }
            other => panic!("expected return, got {other:?}"),
        }
    }

    fn define_args(items: &[ast::ModuleItem]) -> Vec<ast::ExprOrSpread> {
        assert_eq!(items.len(), 1);
        match &items[0] {
            ast::ModuleItem::Stmt(ast::Stmt::Expr(stmt)) => match &*stmt.expr {
                ast::Expr::Call(call) => call.args.clone(),
                other => panic!("expected define call, got {other:?}"),
            },
            other => panic!("expected define statement, got {other:?}"),
        }
    }
}
