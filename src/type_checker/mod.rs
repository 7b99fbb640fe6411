mod borrow;
mod checker;
mod node_type;
mod registry;
mod scope;

pub use borrow::BorrowTracker;
pub use checker::TypeChecker;
pub use node_type::{is_assignable, NodeType};
pub use registry::{EnumRegistry, FunctionRegistry, FunctionSig, StructRegistry};
pub use scope::{Binding, LoopContext, TypeEnvironment};
