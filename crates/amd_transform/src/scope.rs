//! Lexical scope tracking for "is this name bound here" queries.
//!
//! A [`ScopeStack`] holds one name set per open scope. Visitors push a set
//! when entering a module, function, block, catch clause or `for` head and
//! pop it on the way out; the sets are computed up front with the helpers
//! below so that hoisted `var` and function names are visible before
//! their declaration.

use std::collections::HashSet;

use swc_ecma_ast as ast;
use swc_ecma_visit::{Visit, VisitWith};

/// Answers whether an identifier has a local binding at the current point.
pub trait BindingLookup {
    fn has_binding(&self, name: &str) -> bool;
}

/// Stack of lexical scopes, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<HashSet<String>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, names: HashSet<String>) {
        self.scopes.push(names);
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl BindingLookup for ScopeStack {
    fn has_binding(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.contains(name))
    }
}

/// Collect every name bound by a pattern, in source order.
pub fn pat_names(pat: &ast::Pat, out: &mut impl Extend<String>) {
    match pat {
        ast::Pat::Ident(b) => out.extend(Some(b.id.sym.to_string())),
        ast::Pat::Array(a) => {
            for elem in a.elems.iter().flatten() {
                pat_names(elem, out);
            }
        }
        ast::Pat::Rest(r) => pat_names(&r.arg, out),
        ast::Pat::Object(o) => {
            for prop in &o.props {
                match prop {
                    ast::ObjectPatProp::KeyValue(kv) => pat_names(&kv.value, out),
                    ast::ObjectPatProp::Assign(a) => out.extend(Some(a.key.id.sym.to_string())),
                    ast::ObjectPatProp::Rest(r) => pat_names(&r.arg, out),
                }
            }
        }
        ast::Pat::Assign(a) => pat_names(&a.left, out),
        ast::Pat::Invalid(_) | ast::Pat::Expr(_) => {}
    }
}

/// Names declared by a declaration, whatever its kind.
pub fn decl_names(decl: &ast::Decl, out: &mut HashSet<String>) {
    match decl {
        ast::Decl::Class(c) => {
            out.insert(c.ident.sym.to_string());
        }
        ast::Decl::Fn(f) => {
            out.insert(f.ident.sym.to_string());
        }
        ast::Decl::Var(v) => {
            for d in &v.decls {
                pat_names(&d.name, out);
            }
        }
        ast::Decl::Using(u) => {
            for d in &u.decls {
                pat_names(&d.name, out);
            }
        }
        ast::Decl::TsEnum(e) => {
            out.insert(e.id.sym.to_string());
        }
        ast::Decl::TsInterface(_) | ast::Decl::TsTypeAlias(_) | ast::Decl::TsModule(_) => {}
    }
}

/// Block-scoped names declared directly in a statement list:
/// `let`, `const`, `using`, classes and function declarations.
pub fn lexical_names(stmts: &[ast::Stmt]) -> HashSet<String> {
    let mut out = HashSet::new();
    for stmt in stmts {
        if let ast::Stmt::Decl(decl) = stmt {
            match decl {
                ast::Decl::Var(v) if v.kind == ast::VarDeclKind::Var => {}
                _ => decl_names(decl, &mut out),
            }
        }
    }
    out
}

/// `var` names hoisted out of a function body, without entering nested
/// functions or classes.
pub fn hoisted_var_names(stmts: &[ast::Stmt]) -> HashSet<String> {
    let mut collector = VarCollector::default();
    for stmt in stmts {
        stmt.visit_with(&mut collector);
    }
    collector.names
}

/// Names visible at module level: imports, every top-level declaration
/// (exported or not) and hoisted `var`s.
pub fn module_names(items: &[ast::ModuleItem]) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut collector = VarCollector::default();

    for item in items {
        item.visit_with(&mut collector);
        match item {
            ast::ModuleItem::Stmt(ast::Stmt::Decl(decl)) => decl_names(decl, &mut out),
            ast::ModuleItem::Stmt(_) => {}
            ast::ModuleItem::ModuleDecl(decl) => match decl {
                ast::ModuleDecl::Import(import) => {
                    for spec in &import.specifiers {
                        let local = match spec {
                            ast::ImportSpecifier::Named(s) => &s.local,
                            ast::ImportSpecifier::Default(s) => &s.local,
                            ast::ImportSpecifier::Namespace(s) => &s.local,
                        };
                        out.insert(local.sym.to_string());
                    }
                }
                ast::ModuleDecl::ExportDecl(export) => decl_names(&export.decl, &mut out),
                ast::ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                    ast::DefaultDecl::Fn(f) => {
                        if let Some(id) = &f.ident {
                            out.insert(id.sym.to_string());
                        }
                    }
                    ast::DefaultDecl::Class(c) => {
                        if let Some(id) = &c.ident {
                            out.insert(id.sym.to_string());
                        }
                    }
                    ast::DefaultDecl::TsInterfaceDecl(_) => {}
                },
                ast::ModuleDecl::TsImportEquals(import) => {
                    out.insert(import.id.sym.to_string());
                }
                _ => {}
            },
        }
    }

    out.extend(collector.names);
    out
}

/// Parameters plus hoisted `var`s of a function.
pub fn function_names<'a>(
    params: impl IntoIterator<Item = &'a ast::Pat>,
    body: Option<&ast::BlockStmt>,
) -> HashSet<String> {
    let mut out = HashSet::new();
    for pat in params {
        pat_names(pat, &mut out);
    }
    if let Some(body) = body {
        out.extend(hoisted_var_names(&body.stmts));
    }
    out
}

#[derive(Default)]
struct VarCollector {
    names: HashSet<String>,
}

impl Visit for VarCollector {
    fn visit_var_decl(&mut self, n: &ast::VarDecl) {
        if n.kind == ast::VarDeclKind::Var {
            for d in &n.decls {
                pat_names(&d.name, &mut self.names);
            }
        }
        n.visit_children_with(self);
    }

    fn visit_function(&mut self, _: &ast::Function) {}

    fn visit_arrow_expr(&mut self, _: &ast::ArrowExpr) {}

    fn visit_class(&mut self, _: &ast::Class) {}

    fn visit_getter_prop(&mut self, _: &ast::GetterProp) {}

    fn visit_setter_prop(&mut self, _: &ast::SetterProp) {}
}
