use colored::*;
use std::fmt;
use std::path::{Path, PathBuf};

/// One structured problem report: a message plus the file it originated from.
/// Informational messages and warnings flow through the same channel; callers
/// distinguish them by content.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub path: PathBuf,
}

impl Diagnostic {
    pub fn new<M: Into<String>, P: Into<PathBuf>>(message: M, path: P) -> Self {
        Diagnostic {
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.message.starts_with("warning: ")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.path.display())
    }
}

/// Append-only sink for a single compile request. Never fails; stages report
/// into it and the driver hands the accumulated list back to the caller.
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { items: Vec::new() }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn error<M: Into<String>>(&mut self, message: M, path: &Path) {
        self.report(Diagnostic::new(message, path));
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Diagnostic> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Renders diagnostics for terminal consumption. Warnings and informational
/// messages get their own colors; everything else is treated as an error.
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn print(diagnostic: &Diagnostic) {
        let header = if diagnostic.is_warning() {
            "• Warning:".yellow().bold()
        } else if diagnostic.message.starts_with("Checked ")
            || diagnostic.message.starts_with("Compiled ")
        {
            "•".normal().bold()
        } else {
            "• Error:".red().bold()
        };
        println!("{} {}", header, diagnostic);
    }

    pub fn print_all(diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            ConsoleReporter::print(diagnostic);
        }
    }
}
