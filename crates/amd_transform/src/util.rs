//! Small AST builders shared by the lowering and wrapper passes.

use swc_common::{SyntaxContext, DUMMY_SP};
use swc_ecma_ast as ast;

pub(crate) fn ident(name: &str) -> ast::Ident {
    ast::Ident::new_no_ctxt(name.into(), DUMMY_SP)
}

pub(crate) fn ident_expr(name: &str) -> Box<ast::Expr> {
    Box::new(ast::Expr::Ident(ident(name)))
}

pub(crate) fn str_lit(value: &str) -> ast::Str {
    ast::Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }
}

/// Whether `name` can be written as `obj.name` rather than `obj["name"]`.
pub(crate) fn is_valid_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `obj.prop`, or `obj["prop"]` when `prop` is not an identifier name.
pub(crate) fn member(obj: Box<ast::Expr>, prop: &str) -> ast::MemberExpr {
    let prop = if is_valid_ident(prop) {
        ast::MemberProp::Ident(ast::IdentName::new(prop.into(), DUMMY_SP))
    } else {
        ast::MemberProp::Computed(ast::ComputedPropName {
            span: DUMMY_SP,
            expr: Box::new(ast::Expr::Lit(ast::Lit::Str(str_lit(prop)))),
        })
    };
    ast::MemberExpr {
        span: DUMMY_SP,
        obj,
        prop,
    }
}

/// `exports.name`
pub(crate) fn exports_member(name: &str) -> ast::MemberExpr {
    member(ident_expr("exports"), name)
}

/// `target = value;`
pub(crate) fn assign_stmt(target: ast::MemberExpr, value: Box<ast::Expr>) -> ast::Stmt {
    expr_stmt(ast::Expr::Assign(ast::AssignExpr {
        span: DUMMY_SP,
        op: ast::AssignOp::Assign,
        left: ast::AssignTarget::Simple(ast::SimpleAssignTarget::Member(target)),
        right: value,
    }))
}

pub(crate) fn expr_stmt(expr: ast::Expr) -> ast::Stmt {
    ast::Stmt::Expr(ast::ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(expr),
    })
}

/// `var name = init;`
pub(crate) fn var_stmt(name: &str, init: Box<ast::Expr>) -> ast::Stmt {
    ast::Stmt::Decl(ast::Decl::Var(Box::new(ast::VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind: ast::VarDeclKind::Var,
        declare: false,
        decls: vec![ast::VarDeclarator {
            span: DUMMY_SP,
            name: ast::Pat::Ident(ident(name).into()),
            init: Some(init),
            definite: false,
        }],
    })))
}

pub(crate) fn call(callee: Box<ast::Expr>, args: Vec<Box<ast::Expr>>) -> ast::Expr {
    ast::Expr::Call(ast::CallExpr {
        span: DUMMY_SP,
        callee: ast::Callee::Expr(callee),
        args: args
            .into_iter()
            .map(|expr| ast::ExprOrSpread { spread: None, expr })
            .collect(),
        type_args: None,
        ..Default::default()
    })
}

/// `function (<params>) { <stmts> }`
pub(crate) fn fn_expr(params: Vec<ast::Param>, stmts: Vec<ast::Stmt>) -> ast::Expr {
    ast::Expr::Fn(ast::FnExpr {
        ident: None,
        function: Box::new(ast::Function {
            params,
            decorators: vec![],
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            body: Some(ast::BlockStmt {
                span: DUMMY_SP,
                ctxt: SyntaxContext::empty(),
                stmts,
            }),
            is_generator: false,
            is_async: false,
            type_params: None,
            return_type: None,
        }),
    })
}

pub(crate) fn param(name: &str) -> ast::Param {
    ast::Param {
        span: DUMMY_SP,
        decorators: vec![],
        pat: ast::Pat::Ident(ident(name).into()),
    }
}

/// `require("source")`
pub(crate) fn require_call(source: ast::Str) -> ast::Expr {
    call(
        ident_expr("require"),
        vec![Box::new(ast::Expr::Lit(ast::Lit::Str(source)))],
    )
}

/// `"value";` as a directive statement.
pub(crate) fn directive(value: &str) -> ast::Stmt {
    expr_stmt(ast::Expr::Lit(ast::Lit::Str(str_lit(value))))
}

/// A directive is a string-literal expression statement in the prologue.
pub(crate) fn directive_value(item: &ast::ModuleItem) -> Option<&ast::Str> {
    match item {
        ast::ModuleItem::Stmt(ast::Stmt::Expr(ast::ExprStmt { expr, .. })) => match &**expr {
            ast::Expr::Lit(ast::Lit::Str(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

/// Number of leading items forming the directive prologue.
pub(crate) fn directive_count(body: &[ast::ModuleItem]) -> usize {
    body.iter()
        .take_while(|item| directive_value(item).is_some())
        .count()
}
