mod archive;
mod builtins;
mod codegen;
mod instruction;
mod module;

pub use archive::{encode_archive, write_archive, ARCHIVE_EXTENSION, ARCHIVE_MAGIC};
pub use codegen::{Codegen, CodegenError, CodegenOutput};
pub use instruction::Instruction;
pub use module::{BinaryModule, FunctionCode, ModuleBuilder, MODULE_MAGIC};
