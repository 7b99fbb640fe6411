use crate::source;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MANIFEST_NAME: &str = "vela.toml";
const DEFAULT_MAIN: &str = "src/main.vela";

#[derive(Debug)]
pub enum ProjectError {
    Manifest(io::Error),
    MissingMain(PathBuf),
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProjectError::Manifest(error) => {
                write!(f, "Failed to read {}: {}", MANIFEST_NAME, error)
            }
            ProjectError::MissingMain(path) => write!(
                f,
                "Missing main file declared in {}: {}",
                MANIFEST_NAME,
                path.display()
            ),
        }
    }
}

impl std::error::Error for ProjectError {}

/// The subset of `vela.toml` the compiler reads: a package name, an optional
/// entry point override, and path dependencies.
///
/// The parser is deliberately line-oriented rather than a full TOML reader.
/// Only `key = value` pairs and `[section]` headers appear in manifests, plus
/// `name = { path = "..." }` inline tables under `[dependencies]`.
#[derive(Debug)]
pub struct ProjectManifest {
    pub name: Option<String>,
    pub main: Option<String>,
    pub dependency_paths: Vec<(String, String)>,
}

impl ProjectManifest {
    pub fn load(manifest_path: &Path) -> Result<ProjectManifest, ProjectError> {
        let contents = fs::read_to_string(manifest_path).map_err(ProjectError::Manifest)?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> ProjectManifest {
        let mut name = None;
        let mut main = None;
        let mut dependency_paths = Vec::new();
        let mut section = String::new();

        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            let eq = match trimmed.find('=') {
                Some(index) if index > 0 => index,
                _ => continue,
            };
            let key = trimmed[..eq].trim();
            let value = trimmed[eq + 1..].trim();

            if section == "dependencies" {
                if let Some(path) = parse_dependency_path(value) {
                    dependency_paths.push((key.to_string(), path));
                }
                continue;
            }

            let value = strip_quotes(value);
            match key {
                "name" => name = Some(value.to_string()),
                "main" => main = Some(value.to_string()),
                _ => {}
            }
        }

        ProjectManifest {
            name,
            main,
            dependency_paths,
        }
    }

    /// Resolves each dependency path against the project root, preferring the
    /// dependency's `src/` subdirectory when it has one.
    pub fn dependency_roots(&self, project_root: &Path) -> HashMap<String, PathBuf> {
        let mut roots = HashMap::new();
        for (alias, relative) in &self.dependency_paths {
            let resolved = source::normalize_path(&project_root.join(relative));
            let src_dir = resolved.join("src");
            if src_dir.is_dir() {
                roots.insert(alias.clone(), src_dir);
            } else {
                roots.insert(alias.clone(), resolved);
            }
        }
        roots
    }
}

fn parse_dependency_path(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Some(strip_quotes(trimmed).to_string());
    }
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return None;
    }
    let body = trimmed[1..trimmed.len() - 1].trim();
    for part in body.split(',') {
        let segment = part.trim();
        let eq = match segment.find('=') {
            Some(index) if index > 0 => index,
            _ => continue,
        };
        let key = segment[..eq].trim();
        let value = segment[eq + 1..].trim();
        if key == "path" {
            return Some(strip_quotes(value).to_string());
        }
    }
    None
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// What the driver needs to start a compile: the entry file, the project
/// root, and resolved dependency roots keyed by alias.
#[derive(Debug)]
pub struct ProjectConfig {
    pub entry_path: PathBuf,
    pub root: PathBuf,
    pub dependencies: HashMap<String, PathBuf>,
}

pub struct ProjectLoader;

impl ProjectLoader {
    /// Accepts either a project directory or a single source file. For a
    /// directory the manifest's `main` picks the entry point; for a file the
    /// manifest is found by walking up the directory tree.
    pub fn load(input_path: &Path) -> Result<ProjectConfig, ProjectError> {
        let input = absolute(input_path);

        if input.is_dir() {
            let manifest_path = input.join(MANIFEST_NAME);
            if manifest_path.exists() {
                let manifest = ProjectManifest::load(&manifest_path)?;
                let main = manifest.main.as_deref().unwrap_or(DEFAULT_MAIN);
                let entry = source::normalize_path(&input.join(main));
                if !entry.exists() {
                    return Err(ProjectError::MissingMain(entry));
                }
                let dependencies = manifest.dependency_roots(&input);
                return Ok(ProjectConfig {
                    entry_path: entry,
                    root: input,
                    dependencies,
                });
            }
            // No manifest: treat the directory as a bare project rooted at
            // the default entry file.
            let entry = source::normalize_path(&input.join(DEFAULT_MAIN));
            if !entry.exists() {
                return Err(ProjectError::MissingMain(entry));
            }
            return Ok(ProjectConfig {
                entry_path: entry,
                root: input,
                dependencies: HashMap::new(),
            });
        }

        let project_root = find_project_root(&input);
        let mut dependencies = HashMap::new();
        if let Some(root) = &project_root {
            let manifest_path = root.join(MANIFEST_NAME);
            if manifest_path.exists() {
                dependencies = ProjectManifest::load(&manifest_path)?.dependency_roots(root);
            }
        }
        let root = match project_root {
            Some(root) => root,
            None => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        Ok(ProjectConfig {
            entry_path: input,
            root,
            dependencies,
        })
    }
}

fn find_project_root(file_path: &Path) -> Option<PathBuf> {
    let mut current = file_path.parent();
    while let Some(dir) = current {
        if dir.join(MANIFEST_NAME).exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        source::normalize_path(path)
    } else {
        match std::env::current_dir() {
            Ok(cwd) => source::normalize_path(&cwd.join(path)),
            Err(_) => source::normalize_path(path),
        }
    }
}
