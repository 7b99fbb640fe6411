use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub type Source = Rc<SourceImpl>;

#[derive(Debug)]
pub struct SourceImpl {
    pub path: PathBuf,
    pub contents: String,
}

pub fn file(path: &Path) -> io::Result<Source> {
    let contents = fs::read_to_string(path)?;
    Ok(Rc::new(SourceImpl {
        path: path.to_path_buf(),
        contents,
    }))
}

pub fn text(name: &str, text: &str) -> Source {
    Rc::new(SourceImpl {
        path: PathBuf::from(name),
        contents: String::from(text),
    })
}

/// Lexically normalizes a path, collapsing `.` and `..` components without
/// touching the filesystem. The loader builds candidate paths for files that
/// may not exist, so `fs::canonicalize` is not usable here.
pub fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
