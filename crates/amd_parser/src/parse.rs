use anyhow::Result;
use swc_common::{
    comments::SingleThreadedComments, errors::Handler, sync::Lrc, FileName, SourceMap,
};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax};

/// Result of parsing a source file.
pub struct ParseResult {
    pub module: swc_ecma_ast::Module,
    pub comments: SingleThreadedComments,
    pub source_map: Lrc<SourceMap>,
}

/// Pick the parser syntax from the file extension.
///
/// `.ts`, `.tsx`, `.mts` and `.cts` parse as TypeScript; everything else as
/// ECMAScript, with JSX enabled for `.jsx`.
pub fn syntax_for_filename(filename: &str) -> Syntax {
    let is_ts = [".ts", ".tsx", ".mts", ".cts"]
        .iter()
        .any(|ext| filename.ends_with(ext));

    if is_ts {
        Syntax::Typescript(TsSyntax {
            tsx: filename.ends_with(".tsx"),
            decorators: true,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: filename.ends_with(".jsx"),
            ..Default::default()
        })
    }
}

/// Parse a JavaScript/TypeScript source string as a module.
///
/// Syntax errors, including the ones the parser recovers from, are emitted
/// as diagnostics on stderr and turned into an error.
pub fn parse_module(source: &str, filename: &str) -> Result<ParseResult> {
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );

    let comments = SingleThreadedComments::default();

    let handler =
        Handler::with_emitter_writer(Box::new(std::io::stderr()), Some(source_map.clone()));

    let mut recovered = vec![];
    let module = swc_ecma_parser::parse_file_as_module(
        &source_file,
        syntax_for_filename(filename),
        EsVersion::latest(),
        Some(&comments),
        &mut recovered,
    )
    .map_err(|e| {
        e.into_diagnostic(&handler).emit();
        anyhow::anyhow!("failed to parse {filename}")
    })?;

    if !recovered.is_empty() {
        let count = recovered.len();
        for e in recovered {
            e.into_diagnostic(&handler).emit();
        }
        anyhow::bail!("failed to parse {filename}: {count} syntax error(s)");
    }

    tracing::trace!(filename, items = module.body.len(), "parsed module");

    Ok(ParseResult {
        module,
        comments,
        source_map,
    })
}
