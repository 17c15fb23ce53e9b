use anyhow::{Context, Result};
use swc_common::{
    comments::Comments, source_map::DefaultSourceMapGenConfig, sync::Lrc, SourceMap,
};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter, Node};

/// Printed code and, when requested, its source map as JSON.
pub struct Emitted {
    pub code: String,
    pub source_map: Option<String>,
}

/// Print a module with the default code generator settings, without
/// comments.
pub fn emit_module(
    module: &swc_ecma_ast::Module,
    source_map: Lrc<SourceMap>,
    with_source_map: bool,
) -> Result<Emitted> {
    emit_module_with_comments(module, source_map, None, with_source_map)
}

/// Like [`emit_module`], printing the comments collected at parse time.
pub fn emit_module_with_comments(
    module: &swc_ecma_ast::Module,
    source_map: Lrc<SourceMap>,
    comments: Option<&dyn Comments>,
    with_source_map: bool,
) -> Result<Emitted> {
    let mut buf = Vec::new();
    let mut srcmap_buf = if with_source_map { Some(vec![]) } else { None };
    {
        let writer = JsWriter::new(source_map.clone(), "\n", &mut buf, srcmap_buf.as_mut());
        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default()
                .with_target(swc_ecma_ast::EsVersion::latest()),
            cm: source_map.clone(),
            comments,
            wr: writer,
        };
        module.emit_with(&mut emitter)?;
    }

    let code = String::from_utf8(buf)?;

    let source_map = match srcmap_buf {
        Some(srcmap_data) => {
            let srcmap = source_map.build_source_map(&srcmap_data, None, DefaultSourceMapGenConfig);
            let mut srcmap_json = vec![];
            srcmap
                .to_writer(&mut srcmap_json)
                .context("failed to serialize source map")?;
            Some(String::from_utf8(srcmap_json)?)
        }
        None => None,
    };

    Ok(Emitted { code, source_map })
}
