use crate::codegen::{write_archive, Codegen, ARCHIVE_EXTENSION};
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::lexing::Lexer;
use crate::loading::SourceLoader;
use crate::parsing::{Item, Parser};
use crate::project::{ProjectConfig, ProjectLoader};
use crate::source::Source;
use crate::type_checker::TypeChecker;
use log::trace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What the driver should do with one invocation: where to find the
/// program, whether to stop after checking, and where the archive goes.
/// `dependency_roots` supplies extra `@alias` roots on top of whatever the
/// project manifest declares; on a clash the request wins.
pub struct CompileRequest {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub emit_artifact: bool,
    pub dependency_roots: HashMap<String, PathBuf>,
}

impl CompileRequest {
    pub fn for_check(input_path: &Path) -> Self {
        CompileRequest {
            input_path: input_path.to_path_buf(),
            output_path: None,
            emit_artifact: false,
            dependency_roots: HashMap::new(),
        }
    }

    pub fn for_build(input_path: &Path, output_path: Option<PathBuf>) -> Self {
        CompileRequest {
            input_path: input_path.to_path_buf(),
            output_path,
            emit_artifact: true,
            dependency_roots: HashMap::new(),
        }
    }
}

pub struct CompileResult {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the full pipeline: project resolution, source graph loading,
/// per-file lexing and parsing, whole-program type checking, and (for
/// builds) code generation plus archive emission. A file that fails to
/// lex or parse poisons the compile but later files are still processed
/// so their diagnostics surface in the same run.
pub fn compile(request: &CompileRequest) -> CompileResult {
    let mut diagnostics = Diagnostics::new();

    let config = match ProjectLoader::load(&request.input_path) {
        Ok(config) => config,
        Err(error) => {
            diagnostics.error(error.to_string(), &request.input_path);
            return failed(diagnostics);
        }
    };

    let mut aliases = config.dependencies.clone();
    for (alias, root) in &request.dependency_roots {
        aliases.insert(alias.clone(), root.clone());
    }
    let loader = SourceLoader::with_aliases(aliases);
    let sources = match loader.load_graph(&config.entry_path) {
        Ok(sources) => sources,
        Err(error) => {
            diagnostics.error(error.to_string(), &config.entry_path);
            return failed(diagnostics);
        }
    };
    trace!(target: "compiler", "Loaded {} source file(s)", sources.len());

    let mut items: Vec<Item> = Vec::new();
    let mut success = true;
    for source in &sources {
        match parse_source(source, &mut diagnostics) {
            Some(parsed) => items.extend(parsed),
            None => success = false,
        }
    }

    if success {
        success = TypeChecker::check(&items, &mut diagnostics);
    }

    if success && request.emit_artifact {
        success = emit_artifact(request, &config, &items, &mut diagnostics);
    }

    if success {
        let verb = if request.emit_artifact { "Compiled" } else { "Checked" };
        diagnostics.report(Diagnostic::new(
            format!("{} {} source file(s).", verb, sources.len()),
            &config.entry_path,
        ));
    }

    CompileResult {
        success,
        diagnostics: diagnostics.into_items(),
    }
}

fn parse_source(source: &Source, diagnostics: &mut Diagnostics) -> Option<Vec<Item>> {
    let tokens = Lexer::new(source).lex(diagnostics).ok()?;
    let module = Parser::new(source, &tokens, diagnostics).parse().ok()?;
    Some(module.items)
}

fn emit_artifact(
    request: &CompileRequest,
    config: &ProjectConfig,
    items: &[Item],
    diagnostics: &mut Diagnostics,
) -> bool {
    let module_name = module_name(config);
    let output = match &request.output_path {
        Some(path) => path.clone(),
        None => config.root.join(&module_name).with_extension(ARCHIVE_EXTENSION),
    };
    let generated = match Codegen::emit(items, &module_name) {
        Ok(generated) => generated,
        Err(error) => {
            diagnostics.error(format!("Codegen error: {}", error), &config.entry_path);
            return false;
        }
    };
    trace!(target: "compiler", "Writing {} module(s) to {}", generated.modules.len(), output.display());
    if let Err(error) = write_archive(&output, &generated.entry, &generated.modules) {
        diagnostics.error(
            format!("Failed to write archive {}: {}", output.display(), error),
            &config.entry_path,
        );
        return false;
    }
    true
}

fn module_name(config: &ProjectConfig) -> String {
    config
        .root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("main"))
}

fn failed(diagnostics: Diagnostics) -> CompileResult {
    CompileResult {
        success: false,
        diagnostics: diagnostics.into_items(),
    }
}
