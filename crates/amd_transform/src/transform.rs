//! The AMD transform visitor: classify, lower, collect, wrap.

use amd_ast::{AmdOptions, ModuleFlags};
use serde::Serialize;
use swc_ecma_ast as ast;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::classify::{classify_entry, SkipReason};
use crate::collect::{collect_dependencies, Dependencies};
use crate::commonjs::{insert_use_strict, lower_module, LoweringSummary};
use crate::naming::ModuleNamer;
use crate::wrapper::build_wrapper;

/// Per-module working state. A fresh one is built for every module.
#[derive(Debug, Default)]
pub struct TransformState {
    pub flags: ModuleFlags,
    pub deps: Dependencies,
}

/// What one run of the transform did to a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    pub flags: ModuleFlags,
    pub module_name: Option<String>,
    pub dependencies: Vec<String>,
    pub params: Vec<String>,
    /// Set when ES module syntax was lowered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowered: Option<LoweringSummary>,
}

impl TransformReport {
    fn skipped(reason: SkipReason, flags: ModuleFlags) -> Self {
        Self {
            skipped: Some(reason),
            flags,
            ..Default::default()
        }
    }

    pub fn was_wrapped(&self) -> bool {
        self.skipped.is_none()
    }
}

/// Rewrites one module into a single `define(...)` call.
///
/// The instance remembers that it ran; visiting another module with the
/// same instance leaves that module untouched.
pub struct AmdTransform<N> {
    options: AmdOptions,
    namer: N,
    ran: bool,
    report: Option<TransformReport>,
}

impl<N: ModuleNamer> AmdTransform<N> {
    pub fn new(options: AmdOptions, namer: N) -> Self {
        Self {
            options,
            namer,
            ran: false,
            report: None,
        }
    }

    /// The report of the last visited module, if any.
    pub fn report(&self) -> Option<&TransformReport> {
        self.report.as_ref()
    }

    pub fn take_report(&mut self) -> Option<TransformReport> {
        self.report.take()
    }

    fn run(&mut self, module: &mut ast::Module) -> TransformReport {
        let mut state = TransformState::default();

        if self.ran {
            tracing::debug!("transform already ran; module left as is");
            return TransformReport::skipped(SkipReason::AlreadyRan, state.flags);
        }
        if let Some(reason) = classify_entry(module, &mut state.flags) {
            tracing::debug!(?reason, "module is already AMD; skipping");
            return TransformReport::skipped(reason, state.flags);
        }

        let lowered = self
            .options
            .lower_esm
            .then(|| lower_module(module, self.options.es_module_marker));
        if self.options.strict_mode {
            insert_use_strict(module);
        }

        state.deps = collect_dependencies(module, &mut state.flags);
        if state.deps.is_empty() {
            tracing::debug!("module has no dependencies");
        }
        let module_name = self.namer.module_name();

        let body = std::mem::take(&mut module.body);
        module.body = build_wrapper(body, &state.deps, &state.flags, module_name.clone());
        self.ran = true;

        let report = TransformReport {
            skipped: None,
            flags: state.flags,
            module_name,
            dependencies: state.deps.source_values(),
            params: state.deps.param_names(),
            lowered,
        };
        tracing::debug!(
            dependencies = ?report.dependencies,
            params = ?report.params,
            has_exports = report.flags.has_exports,
            has_module = report.flags.has_module,
            "wrapped module in define()"
        );
        report
    }
}

impl<N: ModuleNamer> VisitMut for AmdTransform<N> {
    fn visit_mut_module(&mut self, module: &mut ast::Module) {
        let report = self.run(module);
        self.report = Some(report);
    }
}

/// A visitor performing the AMD transform.
pub fn amd<N: ModuleNamer>(options: AmdOptions, namer: N) -> AmdTransform<N> {
    AmdTransform::new(options, namer)
}

/// Transform `module` in one call, returning it with the report.
pub fn transform_module(
    mut module: ast::Module,
    options: &AmdOptions,
    namer: &impl ModuleNamer,
) -> (ast::Module, TransformReport) {
    let mut transform = AmdTransform::new(options.clone(), BorrowedNamer(namer));
    module.visit_mut_with(&mut transform);
    let report = transform.take_report().unwrap_or_default();
    (module, report)
}

struct BorrowedNamer<'a, N: ?Sized>(&'a N);

impl<N: ModuleNamer + ?Sized> ModuleNamer for BorrowedNamer<'_, N> {
    fn module_name(&self) -> Option<String> {
        self.0.module_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{NoModuleName, OptionsModuleNamer};
    use amd_parser::{emit_module, emit_module_with_comments, parse_module};

    fn squash(code: &str) -> String {
        code.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn run_with(src: &str, options: &AmdOptions) -> (String, TransformReport) {
        let parsed = parse_module(src, "src/app/main.js").unwrap();
        let namer = OptionsModuleNamer::new(options, Some("src/app/main.js"));
        let (module, report) = transform_module(parsed.module, options, &namer);
        let code = emit_module(&module, parsed.source_map, false).unwrap().code;
        (code, report)
    }

    fn run(src: &str) -> (String, TransformReport) {
        run_with(src, &AmdOptions::default())
    }

    #[test]
    fn wraps_commonjs_module() {
        let (code, report) = run(
            "\"use strict\";\nvar a = require(\"a\");\nrequire(\"b\");\nexport default function main(){ return a; }",
        );
        assert_eq!(
            squash(&code),
            squash(
                "define([\"a\", \"b\"], function(a) {
                    \"use strict\";
                    var exports = {};
                    exports.default = function main() { return a; };
                    return exports.default;
                });"
            )
        );
        assert!(report.was_wrapped());
        assert!(report.flags.has_default);
        assert_eq!(report.dependencies, vec!["a", "b"]);
        assert_eq!(report.params, vec!["a"]);
    }

    #[test]
    fn named_sources_precede_bare_ones() {
        let (code, report) = run("require(\"Z\");\nconst x = require(\"X\");\nconst y = require(\"Y\");");
        assert_eq!(report.dependencies, vec!["X", "Y", "Z"]);
        assert_eq!(report.params, vec!["x", "y"]);
        assert!(squash(&code).ends_with(&squash("function(x, y) { var exports = {}; return exports; });")));
    }

    #[test]
    fn bare_duplicates_of_named_sources_are_dropped() {
        let (_, report) = run("require(\"a\");\nconst a = require(\"a\");\nrequire(\"b\");\nrequire(\"b\");");
        assert_eq!(report.dependencies, vec!["a", "b"]);
    }

    #[test]
    fn already_wrapped_modules_are_left_alone() {
        let src = "define([\"a\"], function (a) { return a; });";
        let parsed = parse_module(src, "input.js").unwrap();
        let before = parsed.module.clone();
        let (after, report) = transform_module(parsed.module, &AmdOptions::default(), &NoModuleName);
        assert_eq!(report.skipped, Some(SkipReason::AlreadyWrapped));
        assert_eq!(before, after);
    }

    #[test]
    fn stray_define_call_skips_the_module() {
        let (code, report) = run("var a = require(\"a\");\nfunction later() { define(a); }");
        assert_eq!(report.skipped, Some(SkipReason::DefineCall));
        assert!(code.contains("require(\"a\")"));
    }

    #[test]
    fn output_is_a_fixed_point() {
        let (first, _) = run("import x from \"x\";\nexport const y = x + 1;");
        let (second, report) = run(&first);
        assert_eq!(report.skipped, Some(SkipReason::AlreadyWrapped));
        assert_eq!(squash(&first), squash(&second));
    }

    #[test]
    fn one_instance_transforms_once() {
        let mut transform = amd(AmdOptions::default(), NoModuleName);

        let mut first = parse_module("var a = require(\"a\");", "a.js").unwrap().module;
        first.visit_mut_with(&mut transform);
        assert!(transform.report().is_some_and(TransformReport::was_wrapped));

        let mut second = parse_module("var b = require(\"b\");", "b.js").unwrap().module;
        let before = second.clone();
        second.visit_mut_with(&mut transform);
        assert_eq!(
            transform.report().and_then(|r| r.skipped),
            Some(SkipReason::AlreadyRan)
        );
        assert_eq!(before, second);
    }

    #[test]
    fn module_name_comes_first() {
        let options = AmdOptions {
            module_ids: true,
            source_root: Some("src".into()),
            ..Default::default()
        };
        let (code, report) = run_with("var a = require(\"a\");", &options);
        assert_eq!(report.module_name.as_deref(), Some("app/main"));
        assert!(squash(&code).starts_with(&squash("define(\"app/main\", [\"a\"], function(a)")));
    }

    #[test]
    fn free_exports_and_module_are_reported() {
        let (_, report) = run("module.exports = function () { return exports; };");
        assert!(report.flags.has_exports);
        assert!(report.flags.has_module);
        assert!(!report.flags.has_default);
    }

    #[test]
    fn strict_mode_and_marker_land_inside_the_factory() {
        let options = AmdOptions {
            strict_mode: true,
            es_module_marker: true,
            ..Default::default()
        };
        let (code, _) = run_with("export const a = 1;", &options);
        assert_eq!(
            squash(&code),
            squash(
                "define([], function() {
                    \"use strict\";
                    var exports = {};
                    Object.defineProperty(exports, \"__esModule\", { value: true });
                    const a = 1;
                    exports.a = a;
                    return exports;
                });"
            )
        );
    }

    #[test]
    fn lowering_can_be_disabled() {
        let options = AmdOptions {
            lower_esm: false,
            ..Default::default()
        };
        let (code, report) = run_with("var a = require(\"a\");\nexport const b = a;", &options);
        assert_eq!(report.params, vec!["a"]);
        assert!(!code.contains("exports.b"));
    }

    #[test]
    fn report_serializes_without_skip_field() {
        let (_, report) = run("var a = require(\"a\");");
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("skipped").is_none());
        assert_eq!(json["dependencies"], serde_json::json!(["a"]));
        assert_eq!(json["flags"]["has_default"], serde_json::json!(false));
        assert_eq!(
            json["lowered"],
            serde_json::json!({ "imports": 0, "exports": 0, "renamed": 0 })
        );
    }

    #[test]
    fn report_carries_the_lowering_summary() {
        let (_, report) = run("import a from \"a\";\nexport const b = a;\nexport default b;");
        assert_eq!(
            report.lowered,
            Some(LoweringSummary { imports: 1, exports: 2, renamed: 0 })
        );

        let options = AmdOptions {
            lower_esm: false,
            ..Default::default()
        };
        let (_, report) = run_with("var a = require(\"a\");", &options);
        assert_eq!(report.lowered, None);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("lowered").is_none());
    }

    #[test]
    fn local_require_function_does_not_hide_imports() {
        let (code, report) = run("import { a } from \"m\";\na();\nfunction require() {}");
        assert_eq!(report.dependencies, vec!["m"]);
        assert_eq!(report.params, vec!["_m"]);
        assert_eq!(report.lowered.map(|l| l.renamed), Some(1));
        assert_eq!(
            squash(&code),
            squash(
                "define([\"m\"], function(_m) {
                    var exports = {};
                    var a = _m.a;
                    a();
                    function _require() {}
                    return exports;
                });"
            )
        );
    }

    #[test]
    fn comments_move_into_the_factory() {
        let parsed = parse_module(
            "var a = require(\"a\");\n// start the app\na.start();\n/* then stop */\na.stop();\n",
            "main.js",
        )
        .unwrap();
        let (module, _) = transform_module(parsed.module, &AmdOptions::default(), &NoModuleName);
        let code = emit_module_with_comments(&module, parsed.source_map, Some(&parsed.comments), false)
            .unwrap()
            .code;
        assert!(code.starts_with("define("));
        assert!(code.contains("// start the app"));
        assert!(code.contains("/* then stop */"));
    }

    #[test]
    fn default_export_used_before_its_declaration() {
        let (code, report) = run("main();\nexport default function main() {}");
        assert!(report.flags.has_default);
        assert_eq!(
            squash(&code),
            squash(
                "define([], function() {
                    var exports = {};
                    main();
                    function main() {}
                    exports.default = main;
                    return exports.default;
                });"
            )
        );
    }
}
