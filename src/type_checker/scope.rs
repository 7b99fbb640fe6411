use super::node_type::NodeType;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Binding {
    pub node_type: NodeType,
    pub mutable: bool,
    pub moved: bool,
}

/// Local bindings visible at one point in a function body, with may-move
/// state. Branch constructs fork the environment, check each arm against the
/// fork, and fold the arms' move state back into the parent.
#[derive(Clone, Debug, Default)]
pub struct TypeEnvironment {
    locals: HashMap<String, Binding>,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        TypeEnvironment {
            locals: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: &str, node_type: NodeType, mutable: bool) {
        self.locals.insert(
            name.to_string(),
            Binding {
                node_type,
                mutable,
                moved: false,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.locals.get(name)
    }

    pub fn mark_moved(&mut self, name: &str) {
        if let Some(binding) = self.locals.get_mut(name) {
            binding.moved = true;
        }
    }

    pub fn clear_moved(&mut self, name: &str) {
        if let Some(binding) = self.locals.get_mut(name) {
            binding.moved = false;
        }
    }

    pub fn fork(&self) -> TypeEnvironment {
        self.clone()
    }

    /// A branch that may or may not have run: anything it moved is now
    /// possibly moved here.
    pub fn merge_moved_from(&mut self, branch: &TypeEnvironment) {
        for (name, binding) in self.locals.iter_mut() {
            if let Some(other) = branch.locals.get(name) {
                if other.moved {
                    binding.moved = true;
                }
            }
        }
    }

    /// Exactly one of two branches ran; moved in either means possibly moved.
    pub fn join_moved_from(&mut self, then_env: &TypeEnvironment, else_env: &TypeEnvironment) {
        for (name, binding) in self.locals.iter_mut() {
            let then_moved = then_env.locals.get(name).map_or(false, |b| b.moved);
            let else_moved = else_env.locals.get(name).map_or(false, |b| b.moved);
            if then_moved || else_moved {
                binding.moved = true;
            }
        }
    }

    /// A block that definitely ran: its move state replaces ours for every
    /// binding we share.
    pub fn adopt_moved_from(&mut self, block: &TypeEnvironment) {
        for (name, binding) in self.locals.iter_mut() {
            if let Some(other) = block.locals.get(name) {
                binding.moved = other.moved;
            }
        }
    }

    /// One of many match arms ran. Moves are unioned across all arms since
    /// the checker does not know which arm executes.
    pub fn join_moved_from_all(&mut self, arms: &[TypeEnvironment]) {
        for (name, binding) in self.locals.iter_mut() {
            for arm in arms {
                if arm.locals.get(name).map_or(false, |b| b.moved) {
                    binding.moved = true;
                    break;
                }
            }
        }
    }
}

/// One entry in the active loop stack. `allows_value` is true only for
/// `loop` expressions, where `break <expr>` carries the loop's value.
#[derive(Debug)]
pub struct LoopContext {
    pub label: Option<String>,
    pub allows_value: bool,
    pub break_type: Option<NodeType>,
}

impl LoopContext {
    pub fn statement(label: Option<String>) -> Self {
        LoopContext {
            label,
            allows_value: false,
            break_type: None,
        }
    }

    pub fn expression() -> Self {
        LoopContext {
            label: None,
            allows_value: true,
            break_type: None,
        }
    }
}
