use crate::source::{self, Source};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum LoadError {
    Missing(PathBuf),
    UnknownAlias(String),
    Cycle(String),
    Io(PathBuf, io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Missing(path) => {
                write!(f, "Missing imported source file: {}", path.display())
            }
            LoadError::UnknownAlias(alias) => {
                write!(f, "Unknown dependency alias in import: @{}", alias)
            }
            LoadError::Cycle(path) => write!(f, "Import cycle detected: {}", path),
            LoadError::Io(path, error) => {
                write!(f, "Failed to read source file {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// The import directives a file can carry, scanned line by line before the
/// file is handed to the lexer.
enum Directive {
    Import(String),
    Mod(Vec<String>),
}

/// Walks the import graph rooted at an entry file and returns the sources in
/// dependency order, each file before everything that imports it.
pub struct SourceLoader {
    aliases: HashMap<String, PathBuf>,
}

impl SourceLoader {
    pub fn new() -> Self {
        SourceLoader {
            aliases: HashMap::new(),
        }
    }

    pub fn with_aliases(aliases: HashMap<String, PathBuf>) -> Self {
        SourceLoader { aliases }
    }

    /// Depth-first walk emitting files in postorder. `visited` marks fully
    /// processed files, `on_stack` the active recursion for cycle detection,
    /// and `stack` exists only to format the cycle path in the error.
    pub fn load_graph(&self, entry: &Path) -> Result<Vec<Source>, LoadError> {
        let entry = source::normalize_path(entry);
        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut stack = Vec::new();
        self.load_recursive(&entry, &mut ordered, &mut visited, &mut on_stack, &mut stack)?;
        trace!(target: "loader", "Loaded {} source files from {}", ordered.len(), entry.display());
        Ok(ordered)
    }

    fn load_recursive(
        &self,
        path: &Path,
        ordered: &mut Vec<Source>,
        visited: &mut HashSet<PathBuf>,
        on_stack: &mut HashSet<PathBuf>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<(), LoadError> {
        if visited.contains(path) {
            return Ok(());
        }
        if !path.exists() {
            return Err(LoadError::Missing(path.to_path_buf()));
        }
        if on_stack.contains(path) {
            return Err(LoadError::Cycle(format_cycle(path, stack)));
        }

        on_stack.insert(path.to_path_buf());
        stack.push(path.to_path_buf());
        let file = source::file(path).map_err(|error| LoadError::Io(path.to_path_buf(), error))?;
        for directive in parse_directives(&file.contents) {
            let resolved = self.resolve(path, &directive)?;
            self.load_recursive(&resolved, ordered, visited, on_stack, stack)?;
        }
        stack.pop();
        on_stack.remove(path);
        visited.insert(path.to_path_buf());
        ordered.push(file);
        Ok(())
    }

    fn resolve(&self, importer: &Path, directive: &Directive) -> Result<PathBuf, LoadError> {
        let parent = importer.parent().unwrap_or_else(|| Path::new("."));
        match directive {
            Directive::Import(import_path) => {
                if let Some(rest) = import_path.strip_prefix('@') {
                    let mut pieces = rest.splitn(2, '/');
                    let alias = pieces.next().unwrap_or("");
                    let remainder = pieces.next().unwrap_or("");
                    let root = self
                        .aliases
                        .get(alias)
                        .ok_or_else(|| LoadError::UnknownAlias(alias.to_string()))?;
                    Ok(source::normalize_path(&root.join(remainder)))
                } else {
                    Ok(source::normalize_path(&parent.join(import_path)))
                }
            }
            Directive::Mod(segments) => {
                let extension = importer
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("vela");
                let mut relative = PathBuf::new();
                for segment in segments {
                    relative.push(segment);
                }
                let direct = parent.join(relative.with_extension(extension));
                if direct.exists() {
                    return Ok(source::normalize_path(&direct));
                }
                let mod_file = parent.join(relative.join(format!("mod.{}", extension)));
                if mod_file.exists() {
                    return Ok(source::normalize_path(&mod_file));
                }
                Err(LoadError::Missing(source::normalize_path(&direct)))
            }
        }
    }
}

fn parse_directives(contents: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if let Some(directive) = parse_import(trimmed) {
            directives.push(directive);
        } else if let Some(directive) = parse_mod(trimmed) {
            directives.push(directive);
        }
    }
    directives
}

/// Matches `import "<path>";` with nothing else on the line.
fn parse_import(line: &str) -> Option<Directive> {
    let rest = line.strip_prefix("import")?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let close = rest.find('"')?;
    let path = &rest[..close];
    let tail = rest[close + 1..].trim();
    if tail != ";" {
        return None;
    }
    Some(Directive::Import(path.to_string()))
}

/// Matches `mod a::b;` with nothing else on the line.
fn parse_mod(line: &str) -> Option<Directive> {
    let rest = line.strip_prefix("mod")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim();
    let body = rest.strip_suffix(';')?.trim();
    if body.is_empty() {
        return None;
    }
    let segments: Vec<String> = body.split("::").map(|s| s.trim().to_string()).collect();
    if segments.iter().any(|segment| {
        segment.is_empty()
            || !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }) {
        return None;
    }
    Some(Directive::Mod(segments))
}

fn format_cycle(repeated: &Path, stack: &[PathBuf]) -> String {
    let start = match stack.iter().position(|entry| entry == repeated) {
        Some(index) => index,
        None => return repeated.display().to_string(),
    };
    let mut pieces: Vec<String> = stack[start..]
        .iter()
        .map(|entry| entry.display().to_string())
        .collect();
    pieces.push(repeated.display().to_string());
    pieces.join(" -> ")
}
