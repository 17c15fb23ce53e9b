//! CommonJS / ES module → AMD rewrite.
//!
//! ```text
//! "use strict";
//! var a = require("a");
//! require("b");
//! export default function main() {}
//! ```
//! becomes
//! ```text
//! define(["a", "b"], function (a) {
//!     "use strict";
//!     var exports = {};
//!     exports.default = function main() {};
//!     return exports.default;
//! });
//! ```
//!
//! Passes, in order: [`classify`] (is it AMD already?), [`commonjs`]
//! (ES module syntax down to `require`/`exports`), [`collect`] (pull the
//! requires out), [`wrapper`] (build the `define` call). [`transform`]
//! drives them.

pub mod classify;
pub mod collect;
pub mod commonjs;
pub mod matchers;
pub mod naming;
pub mod scope;
pub mod transform;
mod util;
pub mod wrapper;

pub use classify::SkipReason;
pub use collect::Dependencies;
pub use commonjs::LoweringSummary;
pub use naming::{ModuleNamer, NoModuleName, OptionsModuleNamer};
pub use transform::{amd, transform_module, AmdTransform, TransformReport, TransformState};
