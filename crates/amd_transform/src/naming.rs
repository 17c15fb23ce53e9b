//! Module naming: the optional first argument of `define`.

use amd_ast::AmdOptions;

/// Supplies the module name written into `define(name, ...)`.
pub trait ModuleNamer {
    fn module_name(&self) -> Option<String>;
}

/// Never names the module; `define` gets no name argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModuleName;

impl ModuleNamer for NoModuleName {
    fn module_name(&self) -> Option<String> {
        None
    }
}

impl<F> ModuleNamer for F
where
    F: Fn() -> Option<String>,
{
    fn module_name(&self) -> Option<String> {
        self()
    }
}

/// Names a module from [`AmdOptions`] and the file being compiled.
///
/// - nothing unless `module_ids` is set
/// - `module_id` verbatim when present
/// - otherwise `module_root/` + the filename, relative to `source_root`,
///   without its extension (unless `keep_module_id_extensions`)
#[derive(Debug, Clone, Copy)]
pub struct OptionsModuleNamer<'a> {
    pub options: &'a AmdOptions,
    pub filename: Option<&'a str>,
}

impl<'a> OptionsModuleNamer<'a> {
    pub fn new(options: &'a AmdOptions, filename: Option<&'a str>) -> Self {
        Self { options, filename }
    }
}

impl ModuleNamer for OptionsModuleNamer<'_> {
    fn module_name(&self) -> Option<String> {
        if !self.options.module_ids {
            return None;
        }
        if let Some(id) = &self.options.module_id {
            return Some(id.clone());
        }

        let mut name = String::new();
        if let Some(root) = &self.options.module_root {
            name.push_str(root);
            name.push('/');
        }

        let filename = self.filename?.replace('\\', "/");
        let mut relative = filename.as_str();
        if let Some(source_root) = &self.options.source_root {
            let source_root = source_root.replace('\\', "/");
            if let Some(rest) = relative.strip_prefix(source_root.as_str()) {
                relative = rest;
            }
        }
        let relative = relative.trim_start_matches('/');

        let relative = if self.options.keep_module_id_extensions {
            relative
        } else {
            strip_extension(relative)
        };

        name.push_str(relative);
        Some(name)
    }
}

/// Drop the last `.ext` of the final path segment.
fn strip_extension(path: &str) -> &str {
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[segment_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..segment_start + dot],
        _ => path,
    }
}
