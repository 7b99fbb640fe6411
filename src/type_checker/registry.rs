use super::node_type::NodeType;
use crate::parsing::{EnumDecl, StructDecl, VariantDecl};
use std::collections::HashMap;

#[derive(Debug)]
pub struct StructRegistry {
    structs: HashMap<String, StructDecl>,
}

impl StructRegistry {
    pub fn new() -> Self {
        StructRegistry {
            structs: HashMap::new(),
        }
    }

    pub fn register(&mut self, decl: StructDecl) {
        self.structs.insert(decl.name.clone(), decl);
    }

    pub fn find(&self, name: &str) -> Option<&StructDecl> {
        self.structs.get(name)
    }
}

#[derive(Debug)]
pub struct EnumRegistry {
    enums: HashMap<String, EnumDecl>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        EnumRegistry {
            enums: HashMap::new(),
        }
    }

    /// `Option` and `Result` exist before any user code is seen. Their `Any`
    /// payloads are refined per use site by the checker.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(EnumDecl {
            name: String::from("Option"),
            variants: vec![
                VariantDecl {
                    name: String::from("Some"),
                    payload: Some(crate::parsing::TypeName::Named(String::from("Any"))),
                },
                VariantDecl {
                    name: String::from("None"),
                    payload: None,
                },
            ],
        });
        registry.register(EnumDecl {
            name: String::from("Result"),
            variants: vec![
                VariantDecl {
                    name: String::from("Ok"),
                    payload: Some(crate::parsing::TypeName::Named(String::from("Any"))),
                },
                VariantDecl {
                    name: String::from("Err"),
                    payload: Some(crate::parsing::TypeName::Named(String::from("Any"))),
                },
            ],
        });
        registry
    }

    pub fn register(&mut self, decl: EnumDecl) {
        self.enums.insert(decl.name.clone(), decl);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.get(name)
    }
}

#[derive(Clone, Debug)]
pub struct FunctionSig {
    pub name: String,
    pub return_type: NodeType,
    pub param_types: Vec<NodeType>,
}

#[derive(Debug)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionSig>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, sig: FunctionSig) {
        self.functions.insert(sig.name.clone(), sig);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.get(name)
    }
}
