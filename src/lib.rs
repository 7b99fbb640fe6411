pub mod codegen;
pub mod compiler;
pub mod diagnostic;
pub mod lexing;
pub mod loading;
pub mod parsing;
pub mod project;
pub mod source;
pub mod type_checker;

pub use compiler::{compile, CompileRequest, CompileResult};
pub use diagnostic::{ConsoleReporter, Diagnostic, Diagnostics};
pub use source::{Source, SourceImpl};
