//! Dependency collector.
//!
//! One mutating walk over the module that pulls dependency declarations out
//! of the body:
//!
//! - `require("y");`          → bare dependency, statement removed
//! - `const x = require("y")` → named dependency, declarator removed
//!
//! Anything else that merely looks like a require (extra arguments, a
//! non-literal argument, a destructuring target, a call nested inside a
//! larger expression, a locally bound `require`) stays where it is. Free
//! `exports`/`module` references are noted in the module flags on the way.

use std::collections::HashSet;

use amd_ast::{BareDependency, ModuleFlags, NamedDependency};
use swc_common::DUMMY_SP;
use swc_ecma_ast as ast;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::matchers::{is_require_call, require_source, require_source_of_expr};
use crate::scope::{
    function_names, lexical_names, module_names, pat_names, BindingLookup, ScopeStack,
};

/// Dependencies pulled out of a module, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    pub named: Vec<NamedDependency>,
    pub bare: Vec<BareDependency>,
    seen_sources: HashSet<String>,
}

impl Dependencies {
    pub fn push_named(&mut self, dep: NamedDependency) {
        self.seen_sources.insert(dep.source_value());
        self.named.push(dep);
    }

    pub fn push_bare(&mut self, dep: BareDependency) {
        self.bare.push(dep);
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.bare.is_empty()
    }

    /// Factory parameters: one per named dependency, in order.
    pub fn params(&self) -> Vec<ast::Param> {
        self.named
            .iter()
            .map(|dep| ast::Param {
                span: DUMMY_SP,
                decorators: vec![],
                pat: ast::Pat::Ident(dep.param.clone()),
            })
            .collect()
    }

    /// The dependency array: named sources, then bare sources whose value
    /// has not been seen yet.
    pub fn sources(&self) -> Vec<ast::Str> {
        let mut seen = self.seen_sources.clone();
        let mut out: Vec<ast::Str> = self.named.iter().map(|dep| dep.source.clone()).collect();
        for dep in &self.bare {
            if seen.insert(dep.source_value()) {
                out.push(dep.source.clone());
            }
        }
        out
    }

    pub fn source_values(&self) -> Vec<String> {
        self.sources().iter().map(amd_ast::str_value).collect()
    }

    pub fn param_names(&self) -> Vec<String> {
        self.named
            .iter()
            .map(|dep| dep.param_name().to_string())
            .collect()
    }
}

/// Walk `module`, removing dependency declarations and returning them.
pub fn collect_dependencies(module: &mut ast::Module, flags: &mut ModuleFlags) -> Dependencies {
    let mut collector = DependencyCollector {
        scope: ScopeStack::new(),
        deps: Dependencies::default(),
        flags,
    };
    module.visit_mut_with(&mut collector);
    collector.deps
}

struct DependencyCollector<'a> {
    scope: ScopeStack,
    deps: Dependencies,
    flags: &'a mut ModuleFlags,
}

impl DependencyCollector<'_> {
    /// `require("y");` as a whole statement.
    fn bare_require(&self, stmt: &ast::Stmt) -> Option<BareDependency> {
        match stmt {
            ast::Stmt::Expr(ast::ExprStmt { expr, .. }) => {
                require_source_of_expr(expr, &self.scope).map(|source| BareDependency {
                    source: source.clone(),
                })
            }
            _ => None,
        }
    }

    /// `x = require("y")` with a plain identifier target.
    fn named_require(&self, d: &ast::VarDeclarator) -> Option<NamedDependency> {
        let ast::Pat::Ident(param) = &d.name else {
            return None;
        };
        let ast::Expr::Call(call) = &**d.init.as_ref()? else {
            return None;
        };
        require_source(call, &self.scope).map(|source| NamedDependency {
            param: param.clone(),
            source: source.clone(),
        })
    }

    fn record_bare(&mut self, dep: BareDependency) {
        tracing::trace!(source = %dep.source_value(), "bare dependency");
        self.deps.push_bare(dep);
    }

    fn note_reference(&mut self, name: &str) {
        match name {
            "exports" if !self.scope.has_binding("exports") => self.flags.has_exports = true,
            "module" if !self.scope.has_binding("module") => self.flags.has_module = true,
            _ => {}
        }
    }

    fn with_scope(&mut self, names: HashSet<String>, f: impl FnOnce(&mut Self)) {
        self.scope.push(names);
        f(self);
        self.scope.pop();
    }
}

/// A declaration whose declarators were all pulled out.
fn is_emptied_decl(decl: &ast::Decl) -> bool {
    matches!(decl, ast::Decl::Var(v) if v.decls.is_empty())
}

fn is_emptied_stmt(stmt: &ast::Stmt) -> bool {
    matches!(stmt, ast::Stmt::Decl(decl) if is_emptied_decl(decl))
}

fn is_emptied_item(item: &ast::ModuleItem) -> bool {
    match item {
        ast::ModuleItem::Stmt(stmt) => is_emptied_stmt(stmt),
        ast::ModuleItem::ModuleDecl(ast::ModuleDecl::ExportDecl(export)) => {
            is_emptied_decl(&export.decl)
        }
        ast::ModuleItem::ModuleDecl(_) => false,
    }
}

impl VisitMut for DependencyCollector<'_> {
    fn visit_mut_module(&mut self, n: &mut ast::Module) {
        let names = module_names(&n.body);
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ast::ModuleItem>) {
        let old = std::mem::take(items);
        for mut item in old {
            if let ast::ModuleItem::Stmt(stmt) = &item {
                if let Some(dep) = self.bare_require(stmt) {
                    self.record_bare(dep);
                    continue;
                }
            }
            match &mut item {
                ast::ModuleItem::Stmt(stmt) => stmt.visit_mut_children_with(self),
                ast::ModuleItem::ModuleDecl(decl) => decl.visit_mut_with(self),
            }
            if !is_emptied_item(&item) {
                items.push(item);
            }
        }
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<ast::Stmt>) {
        let old = std::mem::take(stmts);
        for mut stmt in old {
            if let Some(dep) = self.bare_require(&stmt) {
                self.record_bare(dep);
                continue;
            }
            stmt.visit_mut_children_with(self);
            if !is_emptied_stmt(&stmt) {
                stmts.push(stmt);
            }
        }
    }

    // Single-statement positions (`if` branches, loop bodies, labels).
    fn visit_mut_stmt(&mut self, stmt: &mut ast::Stmt) {
        if let Some(dep) = self.bare_require(stmt) {
            self.record_bare(dep);
            *stmt = ast::Stmt::Empty(ast::EmptyStmt { span: DUMMY_SP });
            return;
        }
        stmt.visit_mut_children_with(self);
        if is_emptied_stmt(stmt) {
            *stmt = ast::Stmt::Empty(ast::EmptyStmt { span: DUMMY_SP });
        }
    }

    fn visit_mut_var_decl(&mut self, n: &mut ast::VarDecl) {
        let old = std::mem::take(&mut n.decls);
        for mut d in old {
            if let Some(dep) = self.named_require(&d) {
                tracing::trace!(
                    param = dep.param_name(),
                    source = %dep.source_value(),
                    "named dependency"
                );
                self.deps.push_named(dep);
                continue;
            }
            d.visit_mut_with(self);
            n.decls.push(d);
        }
    }

    fn visit_mut_for_stmt(&mut self, n: &mut ast::ForStmt) {
        let mut names = HashSet::new();
        if let Some(ast::VarDeclOrExpr::VarDecl(v)) = &n.init {
            if v.kind != ast::VarDeclKind::Var {
                for d in &v.decls {
                    pat_names(&d.name, &mut names);
                }
            }
        }
        self.with_scope(names, |this| n.visit_mut_children_with(this));

        if let Some(ast::VarDeclOrExpr::VarDecl(v)) = &n.init {
            if v.decls.is_empty() {
                n.init = None;
            }
        }
    }

    fn visit_mut_for_in_stmt(&mut self, n: &mut ast::ForInStmt) {
        let names = for_head_names(&n.left);
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_for_of_stmt(&mut self, n: &mut ast::ForOfStmt) {
        let names = for_head_names(&n.left);
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_block_stmt(&mut self, n: &mut ast::BlockStmt) {
        let names = lexical_names(&n.stmts);
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_switch_stmt(&mut self, n: &mut ast::SwitchStmt) {
        n.discriminant.visit_mut_with(self);
        let names = n
            .cases
            .iter()
            .flat_map(|case| lexical_names(&case.cons))
            .collect();
        self.with_scope(names, |this| n.cases.visit_mut_with(this));
    }

    fn visit_mut_catch_clause(&mut self, n: &mut ast::CatchClause) {
        let mut names = HashSet::new();
        if let Some(param) = &n.param {
            pat_names(param, &mut names);
        }
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_function(&mut self, n: &mut ast::Function) {
        let names = function_names(n.params.iter().map(|p| &p.pat), n.body.as_ref());
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ast::ArrowExpr) {
        let body = match &*n.body {
            ast::BlockStmtOrExpr::BlockStmt(b) => Some(b),
            ast::BlockStmtOrExpr::Expr(_) => None,
        };
        let names = function_names(n.params.iter(), body);
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_constructor(&mut self, n: &mut ast::Constructor) {
        let mut names = function_names(std::iter::empty(), n.body.as_ref());
        for param in &n.params {
            match param {
                ast::ParamOrTsParamProp::Param(p) => pat_names(&p.pat, &mut names),
                ast::ParamOrTsParamProp::TsParamProp(p) => match &p.param {
                    ast::TsParamPropParam::Ident(b) => {
                        names.insert(b.id.sym.to_string());
                    }
                    ast::TsParamPropParam::Assign(a) => pat_names(&a.left, &mut names),
                },
            }
        }
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_getter_prop(&mut self, n: &mut ast::GetterProp) {
        let names = function_names(std::iter::empty(), n.body.as_ref());
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_setter_prop(&mut self, n: &mut ast::SetterProp) {
        let names = function_names(std::iter::once(&*n.param), n.body.as_ref());
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_fn_expr(&mut self, n: &mut ast::FnExpr) {
        let names = n.ident.iter().map(|id| id.sym.to_string()).collect();
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_class_expr(&mut self, n: &mut ast::ClassExpr) {
        let names = n.ident.iter().map(|id| id.sym.to_string()).collect();
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    // Requires that reach here sit inside a larger expression and stay.
    fn visit_mut_call_expr(&mut self, n: &mut ast::CallExpr) {
        if is_require_call(n, &self.scope) {
            tracing::trace!("require call left in place");
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_expr(&mut self, n: &mut ast::Expr) {
        if let ast::Expr::Ident(ident) = n {
            self.note_reference(&ident.sym);
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_prop(&mut self, n: &mut ast::Prop) {
        if let ast::Prop::Shorthand(ident) = n {
            self.note_reference(&ident.sym);
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_simple_assign_target(&mut self, n: &mut ast::SimpleAssignTarget) {
        if let ast::SimpleAssignTarget::Ident(b) = n {
            self.note_reference(&b.id.sym);
        }
        n.visit_mut_children_with(self);
    }
}

fn for_head_names(head: &ast::ForHead) -> HashSet<String> {
    let mut names = HashSet::new();
    if let ast::ForHead::VarDecl(v) = head {
        if v.kind != ast::VarDeclKind::Var {
            for d in &v.decls {
                pat_names(&d.name, &mut names);
            }
        }
    }
    names
}
