use std::path::{Path, PathBuf};

use amd_ast::AmdOptions;
use amd_parser::{emit_module_with_comments, parse_module, ParseResult};
use amd_transform::{transform_module, OptionsModuleNamer, TransformReport};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

mod logging;

#[derive(Parser)]
#[command(name = "amd", about = "Wrap ES/CommonJS modules in an AMD define() call")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a module into `define(...)` form and print it.
    Transform {
        /// Input .js/.jsx/.ts/.tsx file.
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        options: OptionArgs,
        /// Generate a source map next to the output.
        #[arg(long)]
        source_map: bool,
    },
    /// Print the dependencies the transform would extract, as JSON.
    Deps {
        input: PathBuf,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Parse the file and report any syntax errors.
    Check { input: PathBuf },
    /// Parse and dump the AST.
    Parse {
        input: PathBuf,
        /// Dump as JSON instead of debug output.
        #[arg(long)]
        ast: bool,
    },
}

/// Flags shared by `transform` and `deps`. Each set flag overrides the
/// matching field of the config file.
#[derive(Args)]
struct OptionArgs {
    /// JSON file holding `AmdOptions`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Name the module in the `define` call.
    #[arg(long)]
    module_ids: bool,
    /// Explicit module name (implies --module-ids).
    #[arg(long)]
    module_id: Option<String>,
    /// Prefix for derived module names.
    #[arg(long)]
    module_root: Option<String>,
    /// Path prefix stripped from the filename before deriving a name.
    #[arg(long)]
    source_root: Option<String>,
    /// Keep the file extension in derived module names.
    #[arg(long)]
    keep_extensions: bool,
    /// Leave `import`/`export` declarations alone.
    #[arg(long)]
    no_lower_esm: bool,
    /// Insert a "use strict" directive when missing.
    #[arg(long)]
    strict: bool,
    /// Mark modules with ES exports via `exports.__esModule`.
    #[arg(long)]
    es_module_marker: bool,
}

impl OptionArgs {
    fn resolve(self) -> Result<AmdOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => AmdOptions::default(),
        };

        if self.module_id.is_some() {
            options.module_ids = true;
            options.module_id = self.module_id;
        }
        options.module_ids |= self.module_ids;
        if self.module_root.is_some() {
            options.module_root = self.module_root;
        }
        if self.source_root.is_some() {
            options.source_root = self.source_root;
        }
        options.keep_module_id_extensions |= self.keep_extensions;
        if self.no_lower_esm {
            options.lower_esm = false;
        }
        options.strict_mode |= self.strict;
        options.es_module_marker |= self.es_module_marker;
        Ok(options)
    }
}

fn load_config(path: &Path) -> Result<AmdOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn read_and_parse(input: &Path) -> Result<(String, ParseResult)> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let filename = input.display().to_string();
    let parsed = parse_module(&source, &filename)?;
    Ok((filename, parsed))
}

fn transform_file(
    input: &Path,
    options: &AmdOptions,
) -> Result<(String, ParseResult, TransformReport)> {
    let (filename, mut parsed) = read_and_parse(input)?;
    let namer = OptionsModuleNamer::new(options, Some(filename.as_str()));
    let (module, report) = transform_module(parsed.module, options, &namer);
    parsed.module = module;
    Ok((filename, parsed, report))
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Transform {
            input,
            output,
            options,
            source_map,
        } => {
            let options = options.resolve()?;
            let (filename, parsed, report) = transform_file(&input, &options)?;
            if let Some(reason) = report.skipped {
                eprintln!("{filename}: already AMD ({reason:?}), left unchanged");
            }

            let emitted = emit_module_with_comments(
                &parsed.module,
                parsed.source_map.clone(),
                Some(&parsed.comments),
                source_map,
            )?;
            match &output {
                Some(path) => std::fs::write(path, &emitted.code)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", emitted.code),
            }

            if let Some(map) = emitted.source_map {
                let map_path = match &output {
                    Some(path) => format!("{}.map", path.display()),
                    None => format!("{filename}.map"),
                };
                std::fs::write(&map_path, map)
                    .with_context(|| format!("failed to write {map_path}"))?;
                eprintln!("Source map written to {map_path}");
            }
        }
        Commands::Deps { input, options } => {
            let options = options.resolve()?;
            let (_, _, report) = transform_file(&input, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Check { input } => {
            let (filename, _) = read_and_parse(&input)?;
            eprintln!("OK: {filename}");
        }
        Commands::Parse { input, ast } => {
            let (_, parsed) = read_and_parse(&input)?;
            if ast {
                let json = serde_json::to_string_pretty(&parsed.module)?;
                println!("{json}");
            } else {
                println!("{:#?}", parsed.module);
            }
        }
    }

    Ok(())
}
