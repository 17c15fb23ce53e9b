//! ES module → CommonJS lowering.
//!
//! Turns `import`/`export` items into `require(...)` declarations and
//! `exports.x = ...` assignments so the dependency collector and wrapper
//! builder only ever see CommonJS. Everything an `import` lowers to is
//! hoisted right after the directive prologue; other module declarations
//! are replaced in place.
//!
//! | input                            | output                                              |
//! |----------------------------------|-----------------------------------------------------|
//! | `import "m"`                     | `require("m");`                                     |
//! | `import * as ns from "m"`        | `var ns = require("m");`                            |
//! | `import d, { a } from "m"`       | `var _m = require("m"); var d = <default of _m>; var a = _m.a;` |
//! | `export const n = 1`             | `const n = 1; exports.n = n;`                       |
//! | `export default <expr>`          | `exports.default = <expr>;`                         |
//! | `export default function f(){}`  | `function f(){} exports.default = f;` when `f` is used elsewhere |
//! | `export { a as b } from "m"`     | `var _m = require("m"); exports.b = _m.a;`          |
//! | `export * from "m"`              | `var _m = require("m"); Object.keys(_m).forEach(...)` |
//!
//! The default of a dependency is `_m.default` when it is marked
//! `__esModule`, the dependency itself otherwise. Bindings become
//! snapshots rather than live bindings.
//!
//! A module-level binding named `require`, `exports` or `module` is
//! renamed first so the generated code reaches the real ones.

use std::collections::{HashMap, HashSet};

use amd_ast::str_value;
use serde::Serialize;
use swc_common::DUMMY_SP;
use swc_ecma_ast as ast;
use swc_ecma_visit::{Visit, VisitMut, VisitMutWith, VisitWith};

use crate::scope::{function_names, lexical_names, module_names, pat_names, BindingLookup, ScopeStack};
use crate::util::{
    assign_stmt, call, directive, directive_count, directive_value, expr_stmt, exports_member,
    fn_expr, ident, ident_expr, member, param, require_call, str_lit, var_stmt,
};

const RESERVED: [&str; 3] = ["require", "exports", "module"];

/// What the lowering did to one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoweringSummary {
    /// Import declarations rewritten (type-only ones included).
    pub imports: usize,
    /// Export declarations rewritten (type-only ones included).
    pub exports: usize,
    /// Module-level `require`/`exports`/`module` bindings renamed.
    pub renamed: usize,
}

impl LoweringSummary {
    pub fn has_exports(&self) -> bool {
        self.exports > 0
    }
}

/// Lower every module declaration of `module` to CommonJS statements.
///
/// With `es_module_marker`, modules that had at least one export get
/// `Object.defineProperty(exports, "__esModule", { value: true });`
/// right after the directive prologue.
pub fn lower_module(module: &mut ast::Module, es_module_marker: bool) -> LoweringSummary {
    let has_module_decls = module
        .body
        .iter()
        .any(|item| matches!(item, ast::ModuleItem::ModuleDecl(_)));
    let mut temps = TempNames::new(&module.body);
    let renamed = if has_module_decls {
        rename_reserved_bindings(&mut module.body, &mut temps)
    } else {
        HashMap::new()
    };

    let prologue = directive_count(&module.body);
    let mut lowering = Lowering {
        keep_default_binding: default_binding_used(&module.body),
        temps,
        renamed,
        hoisted: Vec::new(),
        out: Vec::with_capacity(module.body.len()),
        summary: LoweringSummary::default(),
    };
    lowering.summary.renamed = lowering.renamed.len();

    for item in std::mem::take(&mut module.body) {
        match item {
            ast::ModuleItem::ModuleDecl(decl) => lowering.lower_decl(decl),
            stmt => lowering.out.push(stmt),
        }
    }

    let Lowering {
        out,
        hoisted,
        summary,
        ..
    } = lowering;
    let mut out = out.into_iter();
    let mut body: Vec<ast::ModuleItem> = out.by_ref().take(prologue).collect();
    if es_module_marker && summary.has_exports() {
        body.push(ast::ModuleItem::Stmt(es_module_marker_stmt()));
    }
    body.extend(hoisted.into_iter().map(ast::ModuleItem::Stmt));
    body.extend(out);
    module.body = body;

    tracing::debug!(
        imports = summary.imports,
        exports = summary.exports,
        renamed = summary.renamed,
        "lowered ES module declarations"
    );
    summary
}

/// Prepend a `"use strict"` directive unless the prologue already has one.
/// Returns whether a directive was added.
pub fn insert_use_strict(module: &mut ast::Module) -> bool {
    let prologue = directive_count(&module.body);
    let present = module.body[..prologue]
        .iter()
        .filter_map(directive_value)
        .any(|lit| str_value(lit) == "use strict");
    if present {
        return false;
    }
    module
        .body
        .insert(0, ast::ModuleItem::Stmt(directive("use strict")));
    true
}

struct Lowering {
    /// Lower a named `export default function/class` as a declaration.
    keep_default_binding: bool,
    temps: TempNames,
    /// New name → original name of renamed module bindings.
    renamed: HashMap<String, String>,
    /// Import-derived statements, emitted after the directive prologue.
    hoisted: Vec<ast::Stmt>,
    out: Vec<ast::ModuleItem>,
    summary: LoweringSummary,
}

impl Lowering {
    fn push(&mut self, stmt: ast::Stmt) {
        self.out.push(ast::ModuleItem::Stmt(stmt));
    }

    fn export(&mut self, name: &str, value: Box<ast::Expr>) {
        self.push(assign_stmt(exports_member(name), value));
    }

    /// The temporary bound to `require(source)`, declaring it on first use.
    fn source_temp(&mut self, source: &ast::Str) -> String {
        let (name, fresh) = self.temps.for_source(&str_value(source));
        if fresh {
            self.hoisted
                .push(var_stmt(&name, Box::new(require_call(source.clone()))));
        }
        name
    }

    fn lower_decl(&mut self, decl: ast::ModuleDecl) {
        match decl {
            ast::ModuleDecl::Import(import) => {
                self.summary.imports += 1;
                self.lower_import(import);
            }
            ast::ModuleDecl::TsImportEquals(import) => {
                self.summary.imports += 1;
                self.lower_import_equals(*import);
            }
            ast::ModuleDecl::ExportDecl(export) => {
                self.summary.exports += 1;
                self.lower_export_decl(export.decl);
            }
            ast::ModuleDecl::ExportDefaultDecl(export) => {
                self.summary.exports += 1;
                self.lower_default_decl(export.decl);
            }
            ast::ModuleDecl::ExportDefaultExpr(export) => {
                self.summary.exports += 1;
                self.export("default", export.expr);
            }
            ast::ModuleDecl::ExportNamed(export) => {
                self.summary.exports += 1;
                self.lower_named_export(export);
            }
            ast::ModuleDecl::ExportAll(export) => {
                self.summary.exports += 1;
                if export.type_only {
                    return;
                }
                let temp = self.source_temp(&export.src);
                self.push(reexport_all(&temp));
            }
            ast::ModuleDecl::TsExportAssignment(export) => {
                self.summary.exports += 1;
                self.push(expr_stmt(ast::Expr::Assign(ast::AssignExpr {
                    span: DUMMY_SP,
                    op: ast::AssignOp::Assign,
                    left: ast::AssignTarget::Simple(ast::SimpleAssignTarget::Ident(
                        ident("exports").into(),
                    )),
                    right: export.expr,
                })));
            }
            ast::ModuleDecl::TsNamespaceExport(export) => {
                tracing::trace!(name = %export.id.sym, "dropped `export as namespace`");
            }
        }
    }

    fn lower_import(&mut self, import: ast::ImportDecl) {
        if import.type_only {
            return;
        }
        if import.specifiers.is_empty() {
            self.hoisted.push(expr_stmt(require_call(*import.src)));
            return;
        }

        let specifiers: Vec<_> = import
            .specifiers
            .into_iter()
            .filter(|spec| !matches!(spec, ast::ImportSpecifier::Named(n) if n.is_type_only))
            .collect();
        if specifiers.is_empty() {
            return;
        }

        // `* as ns` doubles as the binding the other specifiers read from.
        let namespace = specifiers.iter().find_map(|spec| match spec {
            ast::ImportSpecifier::Namespace(ns) => Some(ns.local.sym.to_string()),
            _ => None,
        });
        let binding = match namespace {
            Some(ns) => {
                self.hoisted
                    .push(var_stmt(&ns, Box::new(require_call((*import.src).clone()))));
                ns
            }
            None => self.source_temp(&import.src),
        };

        for spec in specifiers {
            let (local, imported) = match spec {
                ast::ImportSpecifier::Namespace(_) => continue,
                ast::ImportSpecifier::Default(d) => (d.local, "default".to_string()),
                ast::ImportSpecifier::Named(n) => {
                    let imported = match &n.imported {
                        Some(name) => export_name(name),
                        None => n.local.sym.to_string(),
                    };
                    (n.local, imported)
                }
            };
            let value = imported_value(&binding, &imported);
            self.hoisted.push(var_stmt(&local.sym, Box::new(value)));
        }
    }

    fn lower_import_equals(&mut self, import: ast::TsImportEqualsDecl) {
        if import.is_type_only {
            return;
        }
        let value = match import.module_ref {
            ast::TsModuleRef::TsExternalModuleRef(r) => require_call(r.expr),
            ast::TsModuleRef::TsEntityName(name) => entity_expr(name),
        };
        let name = import.id.sym.to_string();
        self.push(var_stmt(&name, Box::new(value)));
        if import.is_export {
            self.summary.exports += 1;
            self.export(&name, ident_expr(&name));
        }
    }

    fn lower_export_decl(&mut self, decl: ast::Decl) {
        if is_type_only_decl(&decl) {
            return;
        }
        let names = bound_names(&decl);
        self.push(ast::Stmt::Decl(decl));
        for name in names {
            let exported = self.renamed.get(&name).cloned().unwrap_or_else(|| name.clone());
            self.export(&exported, ident_expr(&name));
        }
    }

    fn lower_default_decl(&mut self, decl: ast::DefaultDecl) {
        let keep = self.keep_default_binding;
        match decl {
            ast::DefaultDecl::Fn(ast::FnExpr {
                ident: Some(ident),
                function,
            }) if keep => {
                let name = ident.sym.to_string();
                self.push(ast::Stmt::Decl(ast::Decl::Fn(ast::FnDecl {
                    ident,
                    declare: false,
                    function,
                })));
                self.export("default", ident_expr(&name));
            }
            ast::DefaultDecl::Class(ast::ClassExpr {
                ident: Some(ident),
                class,
            }) if keep => {
                let name = ident.sym.to_string();
                self.push(ast::Stmt::Decl(ast::Decl::Class(ast::ClassDecl {
                    ident,
                    declare: false,
                    class,
                })));
                self.export("default", ident_expr(&name));
            }
            ast::DefaultDecl::Fn(f) => self.export("default", Box::new(ast::Expr::Fn(f))),
            ast::DefaultDecl::Class(c) => self.export("default", Box::new(ast::Expr::Class(c))),
            ast::DefaultDecl::TsInterfaceDecl(_) => {}
        }
    }

    fn lower_named_export(&mut self, export: ast::NamedExport) {
        if export.type_only {
            return;
        }
        let specifiers: Vec<_> = export
            .specifiers
            .into_iter()
            .filter(|spec| !matches!(spec, ast::ExportSpecifier::Named(n) if n.is_type_only))
            .collect();

        let Some(src) = export.src else {
            for spec in specifiers {
                if let ast::ExportSpecifier::Named(n) = spec {
                    let local = export_name(&n.orig);
                    let exported = n.exported.as_ref().map_or_else(|| local.clone(), export_name);
                    self.export(&exported, ident_expr(&local));
                }
            }
            return;
        };

        if specifiers.is_empty() {
            return;
        }
        let temp = self.source_temp(&src);
        for spec in specifiers {
            match spec {
                ast::ExportSpecifier::Namespace(ns) => {
                    self.export(&export_name(&ns.name), ident_expr(&temp));
                }
                ast::ExportSpecifier::Default(d) => {
                    let value = imported_value(&temp, "default");
                    self.export(&d.exported.sym, Box::new(value));
                }
                ast::ExportSpecifier::Named(n) => {
                    let orig = export_name(&n.orig);
                    let exported = n.exported.as_ref().map_or_else(|| orig.clone(), export_name);
                    let value = imported_value(&temp, &orig);
                    self.export(&exported, Box::new(value));
                }
            }
        }
    }
}

/// `binding.name`, or for `default`:
/// `binding && binding.__esModule ? binding.default : binding`.
fn imported_value(binding: &str, name: &str) -> ast::Expr {
    let read = |prop: &str| Box::new(ast::Expr::Member(member(ident_expr(binding), prop)));
    if name != "default" {
        return *read(name);
    }
    ast::Expr::Cond(ast::CondExpr {
        span: DUMMY_SP,
        test: Box::new(ast::Expr::Bin(ast::BinExpr {
            span: DUMMY_SP,
            op: ast::BinaryOp::LogicalAnd,
            left: ident_expr(binding),
            right: read("__esModule"),
        })),
        cons: read("default"),
        alt: ident_expr(binding),
    })
}

/// Whether the name of a named `export default function/class` is used by
/// any other item of the module.
fn default_binding_used(body: &[ast::ModuleItem]) -> bool {
    let found = body.iter().enumerate().find_map(|(at, item)| match item {
        ast::ModuleItem::ModuleDecl(ast::ModuleDecl::ExportDefaultDecl(export)) => {
            let ident = match &export.decl {
                ast::DefaultDecl::Fn(f) => f.ident.as_ref(),
                ast::DefaultDecl::Class(c) => c.ident.as_ref(),
                ast::DefaultDecl::TsInterfaceDecl(_) => None,
            };
            ident.map(|id| (at, id.sym.to_string()))
        }
        _ => None,
    });
    let Some((at, name)) = found else {
        return false;
    };

    let mut idents = IdentCollector::default();
    for (i, item) in body.iter().enumerate() {
        if i != at {
            item.visit_with(&mut idents);
        }
    }
    idents.names.contains(&name)
}

/// Rename module-level `require`/`exports`/`module` bindings to fresh
/// names. Returns new name → original name.
fn rename_reserved_bindings(
    body: &mut Vec<ast::ModuleItem>,
    temps: &mut TempNames,
) -> HashMap<String, String> {
    let bound = module_names(body);
    let mut renamed = HashMap::new();
    for reserved in RESERVED {
        if !bound.contains(reserved) {
            continue;
        }
        let to = temps.fresh(&format!("_{reserved}"));
        body.visit_mut_with(&mut BindingRenamer {
            from: reserved,
            to: &to,
            inner: ScopeStack::new(),
        });
        tracing::debug!(from = reserved, to = %to, "renamed module-level binding");
        renamed.insert(to, reserved.to_string());
    }
    renamed
}

/// Renames the module-level binding `from`, leaving names bound in inner
/// scopes alone. Shorthand properties and patterns keep their key.
struct BindingRenamer<'a> {
    from: &'a str,
    to: &'a str,
    inner: ScopeStack,
}

impl BindingRenamer<'_> {
    fn targets(&self, ident: &ast::Ident) -> bool {
        &*ident.sym == self.from && !self.inner.has_binding(self.from)
    }

    fn key(&self) -> ast::PropName {
        ast::PropName::Ident(ast::IdentName::new(self.from.into(), DUMMY_SP))
    }

    fn with_scope(&mut self, names: HashSet<String>, f: impl FnOnce(&mut Self)) {
        self.inner.push(names);
        f(self);
        self.inner.pop();
    }
}

impl VisitMut for BindingRenamer<'_> {
    fn visit_mut_ident(&mut self, n: &mut ast::Ident) {
        if self.targets(n) {
            n.sym = self.to.into();
        }
    }

    fn visit_mut_prop(&mut self, n: &mut ast::Prop) {
        if let ast::Prop::Shorthand(id) = n {
            if self.targets(id) {
                *n = ast::Prop::KeyValue(ast::KeyValueProp {
                    key: self.key(),
                    value: ident_expr(self.to),
                });
                return;
            }
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_object_pat_prop(&mut self, n: &mut ast::ObjectPatProp) {
        if let ast::ObjectPatProp::Assign(a) = n {
            if self.targets(&a.key.id) {
                let target = ast::Pat::Ident(ident(self.to).into());
                let value = match a.value.take() {
                    Some(mut default) => {
                        default.visit_mut_with(self);
                        ast::Pat::Assign(ast::AssignPat {
                            span: DUMMY_SP,
                            left: Box::new(target),
                            right: default,
                        })
                    }
                    None => target,
                };
                *n = ast::ObjectPatProp::KeyValue(ast::KeyValuePatProp {
                    key: self.key(),
                    value: Box::new(value),
                });
                return;
            }
        }
        n.visit_mut_children_with(self);
    }

    fn visit_mut_import_named_specifier(&mut self, n: &mut ast::ImportNamedSpecifier) {
        if n.imported.is_none() && self.targets(&n.local) {
            n.imported = Some(ast::ModuleExportName::Ident(ident(self.from)));
        }
        n.local.visit_mut_with(self);
    }

    fn visit_mut_named_export(&mut self, n: &mut ast::NamedExport) {
        // Re-exported names belong to the other module.
        if n.src.is_none() {
            n.visit_mut_children_with(self);
        }
    }

    fn visit_mut_export_named_specifier(&mut self, n: &mut ast::ExportNamedSpecifier) {
        if let ast::ModuleExportName::Ident(id) = &n.orig {
            if n.exported.is_none() && self.targets(id) {
                n.exported = Some(ast::ModuleExportName::Ident(ident(self.from)));
            }
        }
        n.orig.visit_mut_with(self);
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

    fn visit_mut_setter_prop(&mut self, n: &mut ast::SetterProp) {
        let names = function_names(std::iter::once(&*n.param), n.body.as_ref());
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_block_stmt(&mut self, n: &mut ast::BlockStmt) {
        let names = lexical_names(&n.stmts);
        self.with_scope(names, |this| n.visit_mut_children_with(this));
    }

    fn visit_mut_catch_clause(&mut self, n: &mut ast::CatchClause) {
        let mut names = HashSet::new();
        if let Some(param) = &n.param {
            pat_names(param, &mut names);
        }
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
}

/// Allocates one temporary per imported source, avoiding every identifier
/// already present in the module.
struct TempNames {
    taken: HashSet<String>,
    by_source: HashMap<String, String>,
}

impl TempNames {
    fn new(body: &[ast::ModuleItem]) -> Self {
        let mut idents = IdentCollector::default();
        for item in body {
            item.visit_with(&mut idents);
        }
        Self {
            taken: idents.names,
            by_source: HashMap::new(),
        }
    }

    /// `base`, or `base2`, `base3`, ... if taken.
    fn fresh(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 2;
        while self.taken.contains(&name) {
            name = format!("{base}{n}");
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }

    /// The temporary for `source` and whether it was just allocated.
    fn for_source(&mut self, source: &str) -> (String, bool) {
        if let Some(name) = self.by_source.get(source) {
            return (name.clone(), false);
        }
        let name = self.fresh(&temp_base(source));
        self.by_source.insert(source.to_string(), name.clone());
        (name, true)
    }
}

/// `_` + the camel-cased basename of `source`, extension removed.
fn temp_base(source: &str) -> String {
    let basename = source
        .rsplit('/')
        .find(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .unwrap_or("");
    let stem = match basename.rfind('.') {
        Some(dot) if dot > 0 => &basename[..dot],
        _ => basename,
    };

    let mut name = String::from("_");
    for (i, word) in stem
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                name.push(first);
            } else {
                name.extend(first.to_uppercase());
            }
            name.extend(chars);
        }
    }

    if name.len() == 1 {
        name.push_str("module");
    }
    name
}

#[derive(Default)]
struct IdentCollector {
    names: HashSet<String>,
}

impl Visit for IdentCollector {
    fn visit_ident(&mut self, n: &ast::Ident) {
        self.names.insert(n.sym.to_string());
    }
}

fn export_name(name: &ast::ModuleExportName) -> String {
    match name {
        ast::ModuleExportName::Ident(id) => id.sym.to_string(),
        ast::ModuleExportName::Str(s) => str_value(s),
    }
}

fn is_type_only_decl(decl: &ast::Decl) -> bool {
    match decl {
        ast::Decl::TsInterface(_) | ast::Decl::TsTypeAlias(_) => true,
        ast::Decl::Class(c) => c.declare,
        ast::Decl::Fn(f) => f.declare,
        ast::Decl::Var(v) => v.declare,
        ast::Decl::TsEnum(e) => e.declare,
        ast::Decl::TsModule(m) => m.declare,
        ast::Decl::Using(_) => false,
    }
}

/// Names a declaration binds, in source order.
fn bound_names(decl: &ast::Decl) -> Vec<String> {
    let mut out = Vec::new();
    match decl {
        ast::Decl::Class(c) => out.push(c.ident.sym.to_string()),
        ast::Decl::Fn(f) => out.push(f.ident.sym.to_string()),
        ast::Decl::Var(v) => {
            for d in &v.decls {
                pat_names(&d.name, &mut out);
            }
        }
        ast::Decl::Using(u) => {
            for d in &u.decls {
                pat_names(&d.name, &mut out);
            }
        }
        ast::Decl::TsEnum(e) => out.push(e.id.sym.to_string()),
        ast::Decl::TsModule(m) => {
            if let ast::TsModuleName::Ident(id) = &m.id {
                out.push(id.sym.to_string());
            }
        }
        ast::Decl::TsInterface(_) | ast::Decl::TsTypeAlias(_) => {}
    }
    out
}

/// `A.B.C` from a TypeScript entity name.
fn entity_expr(name: ast::TsEntityName) -> ast::Expr {
    match name {
        ast::TsEntityName::Ident(id) => ast::Expr::Ident(id),
        ast::TsEntityName::TsQualifiedName(q) => {
            let q = *q;
            ast::Expr::Member(member(Box::new(entity_expr(q.left)), &q.right.sym))
        }
    }
}

/// `Object.defineProperty(exports, "__esModule", { value: true });`
fn es_module_marker_stmt() -> ast::Stmt {
    let descriptor = ast::Expr::Object(ast::ObjectLit {
        span: DUMMY_SP,
        props: vec![ast::PropOrSpread::Prop(Box::new(ast::Prop::KeyValue(
            ast::KeyValueProp {
                key: ast::PropName::Ident(ast::IdentName::new("value".into(), DUMMY_SP)),
                value: Box::new(ast::Expr::Lit(ast::Lit::Bool(ast::Bool {
                    span: DUMMY_SP,
                    value: true,
                }))),
            },
        )))],
    });
    expr_stmt(call(
        Box::new(ast::Expr::Member(member(ident_expr("Object"), "defineProperty"))),
        vec![
            ident_expr("exports"),
            Box::new(ast::Expr::Lit(ast::Lit::Str(str_lit("__esModule")))),
            Box::new(descriptor),
        ],
    ))
}

/// ```text
/// Object.keys(_m).forEach(function (key) {
///     if (key === "default") return;
///     exports[key] = _m[key];
/// });
/// ```
fn reexport_all(temp: &str) -> ast::Stmt {
    let computed = |obj: Box<ast::Expr>| ast::MemberExpr {
        span: DUMMY_SP,
        obj,
        prop: ast::MemberProp::Computed(ast::ComputedPropName {
            span: DUMMY_SP,
            expr: ident_expr("key"),
        }),
    };

    let skip_default = ast::Stmt::If(ast::IfStmt {
        span: DUMMY_SP,
        test: Box::new(ast::Expr::Bin(ast::BinExpr {
            span: DUMMY_SP,
            op: ast::BinaryOp::EqEqEq,
            left: ident_expr("key"),
            right: Box::new(ast::Expr::Lit(ast::Lit::Str(str_lit("default")))),
        })),
        cons: Box::new(ast::Stmt::Return(ast::ReturnStmt {
            span: DUMMY_SP,
            arg: None,
        })),
        alt: None,
    });
    let copy = assign_stmt(
        computed(ident_expr("exports")),
        Box::new(ast::Expr::Member(computed(ident_expr(temp)))),
    );

    let keys = call(
        Box::new(ast::Expr::Member(member(ident_expr("Object"), "keys"))),
        vec![ident_expr(temp)],
    );
    expr_stmt(call(
        Box::new(ast::Expr::Member(member(Box::new(keys), "forEach"))),
        vec![Box::new(fn_expr(vec![param("key")], vec![skip_default, copy]))],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amd_parser::{emit_module, parse_module};

    fn lower_with(src: &str, filename: &str, marker: bool) -> (String, LoweringSummary) {
        let mut parsed = parse_module(src, filename).unwrap();
        let summary = lower_module(&mut parsed.module, marker);
        let code = emit_module(&parsed.module, parsed.source_map.clone(), false)
            .unwrap()
            .code;
        (squash(&code), summary)
    }

    fn lower(src: &str) -> String {
        lower_with(src, "input.js", false).0
    }

    fn squash(code: &str) -> String {
        code.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn side_effect_and_namespace_imports() {
        assert_eq!(lower("import \"polyfill\";"), squash("require(\"polyfill\");"));
        assert_eq!(
            lower("import * as fs from \"fs\";"),
            squash("var fs = require(\"fs\");")
        );
    }

    #[test]
    fn default_and_named_imports_share_one_temporary() {
        let code = lower("import d, { a, b as c } from \"./lib/my-util.js\";\nimport { e } from \"./lib/my-util.js\";");
        assert_eq!(
            code,
            squash(
                "var _myUtil = require(\"./lib/my-util.js\");
                 var d = _myUtil && _myUtil.__esModule ? _myUtil.default : _myUtil;
                 var a = _myUtil.a;
                 var c = _myUtil.b;
                 var e = _myUtil.e;"
            )
        );
    }

    #[test]
    fn temporaries_avoid_existing_identifiers() {
        let code = lower("import { a } from \"lodash\";\nconst _lodash = 1;");
        assert!(code.starts_with(&squash("var _lodash2 = require(\"lodash\");")));
    }

    #[test]
    fn exported_declarations_assign_each_name() {
        let code = lower("export const { a, b: [c] } = obj;\nexport function f() {}\nexport class K {}");
        assert_eq!(
            code,
            squash(
                "const { a, b: [c] } = obj; exports.a = a; exports.c = c;
                 function f() {} exports.f = f;
                 class K {} exports.K = K;"
            )
        );
    }

    #[test]
    fn default_exports() {
        assert_eq!(
            lower("export default function main() {}"),
            squash("exports.default = function main() {};")
        );
        assert_eq!(lower("export default 42;"), squash("exports.default = 42;"));
        assert_eq!(
            lower("export default class {}"),
            squash("exports.default = class {};")
        );
    }

    #[test]
    fn default_declaration_stays_bound_when_referenced() {
        assert_eq!(
            lower("export default function main() {}\nmain();"),
            squash("function main() {} exports.default = main; main();")
        );
        assert_eq!(
            lower("const k = new Foo();\nexport default class Foo {}"),
            squash("const k = new Foo(); class Foo {} exports.default = Foo;")
        );
    }

    #[test]
    fn imports_are_hoisted_above_their_uses() {
        assert_eq!(
            lower("a();\nimport { a } from \"m\";\nimport \"side\";"),
            squash("var _m = require(\"m\"); var a = _m.a; require(\"side\"); a();")
        );
        let (code, _) = lower_with(
            "\"use strict\";\nb();\nexport const c = 1;\nimport b from \"b\";",
            "input.js",
            true,
        );
        assert_eq!(
            code,
            squash(
                "\"use strict\";
                 Object.defineProperty(exports, \"__esModule\", { value: true });
                 var _b = require(\"b\");
                 var b = _b && _b.__esModule ? _b.default : _b;
                 b();
                 const c = 1; exports.c = c;"
            )
        );
    }

    #[test]
    fn reexports_use_the_hoisted_temporary() {
        assert_eq!(
            lower("export { x } from \"m\";\nimport { y } from \"m\";"),
            squash("var _m = require(\"m\"); var y = _m.y; exports.x = _m.x;")
        );
    }

    #[test]
    fn module_level_reserved_names_are_renamed() {
        let (code, summary) = lower_with(
            "import { a } from \"m\";\na(require);\nfunction require() { var module = 1; return module; }",
            "input.js",
            false,
        );
        assert_eq!(summary.renamed, 1);
        assert_eq!(
            code,
            squash(
                "var _m = require(\"m\"); var a = _m.a;
                 a(_require);
                 function _require() { var module = 1; return module; }"
            )
        );
    }

    #[test]
    fn renamed_bindings_keep_their_public_names() {
        assert_eq!(
            lower("export const exports = 1;\nconst o = { exports };\nconst { exports: e = exports } = o;"),
            squash(
                "const _exports = 1; exports.exports = _exports;
                 const o = { exports: _exports };
                 const { exports: e = _exports } = o;"
            )
        );
        assert_eq!(
            lower("export class C { constructor(require) { this.r = require; } }\nfunction require() {}"),
            squash(
                "class C { constructor(require) { this.r = require; } } exports.C = C;
                 function _require() {}"
            )
        );
        assert_eq!(
            lower("let module = 1, _module = 2;\nexport { module };\nfunction f(module) { return module; }"),
            squash(
                "let _module2 = 1, _module = 2;
                 exports.module = _module2;
                 function f(module) { return module; }"
            )
        );
    }

    #[test]
    fn scripts_without_module_syntax_are_not_renamed() {
        let (code, summary) = lower_with("function require() {}\nrequire();", "input.js", false);
        assert_eq!(summary, LoweringSummary::default());
        assert_eq!(code, squash("function require() {} require();"));
    }

    #[test]
    fn local_and_reexported_names() {
        assert_eq!(
            lower("const a = 1, b = 2;\nexport { a, b as c, a as \"a-b\" };"),
            squash("const a = 1, b = 2; exports.a = a; exports.c = b; exports[\"a-b\"] = a;")
        );
        assert_eq!(
            lower("export { x as y, default as z } from \"m\";"),
            squash("var _m = require(\"m\"); exports.y = _m.x; exports.z = _m && _m.__esModule ? _m.default : _m;")
        );
        assert_eq!(
            lower("export * as ns from \"m\";"),
            squash("var _m = require(\"m\"); exports.ns = _m;")
        );
    }

    #[test]
    fn export_all_copies_everything_but_default() {
        assert_eq!(
            lower("export * from \"m\";"),
            squash(
                "var _m = require(\"m\");
                 Object.keys(_m).forEach(function(key) {
                     if (key === \"default\") return;
                     exports[key] = _m[key];
                 });"
            )
        );
    }

    #[test]
    fn typescript_forms() {
        let (code, _) = lower_with(
            "import type { T } from \"types\";\nimport { type U, v } from \"m\";\nimport x = require(\"x\");\nexport interface I {}\nexport type A = string;",
            "input.ts",
            false,
        );
        assert_eq!(
            code,
            squash("var _m = require(\"m\"); var v = _m.v; var x = require(\"x\");")
        );

        let (code, _) = lower_with("const x = 1;\nexport = x;", "input.ts", false);
        assert_eq!(code, squash("const x = 1; exports = x;"));
    }

    #[test]
    fn marker_follows_directives_when_exporting() {
        let (code, summary) = lower_with("\"use strict\";\nexport const a = 1;", "input.js", true);
        assert_eq!(summary, LoweringSummary { imports: 0, exports: 1, renamed: 0 });
        assert!(code.starts_with(&squash(
            "\"use strict\"; Object.defineProperty(exports, \"__esModule\", { value: true });"
        )));

        let (code, _) = lower_with("import \"m\";", "input.js", true);
        assert!(!code.contains("__esModule"));
    }

    #[test]
    fn use_strict_is_added_once() {
        let mut parsed = parse_module("var a = 1;", "input.js").unwrap();
        assert!(insert_use_strict(&mut parsed.module));
        assert!(!insert_use_strict(&mut parsed.module));
        assert_eq!(parsed.module.body.len(), 2);
    }

    #[test]
    fn temp_names_from_sources() {
        assert_eq!(temp_base("react-dom"), "_reactDom");
        assert_eq!(temp_base("@scope/pkg"), "_pkg");
        assert_eq!(temp_base("./utils.js"), "_utils");
        assert_eq!(temp_base("../"), "_module");
        assert_eq!(temp_base("lodash/fp"), "_fp");
    }
}
