use super::codegen::CodegenError;
use super::instruction::Instruction;
use super::module::{BinaryModule, FunctionCode, ModuleBuilder};
use crate::parsing::EnumDecl;

/// Lowers an enum to a standalone binary module: an integer tag plus one
/// boxed payload slot, a static constructor per variant, and a `to_string`
/// that dispatches on the tag through a jump table. `Option` and `Result`
/// go through this same routine as user enums; only their declarations are
/// synthesized.
pub fn emit_tagged_union(decl: &EnumDecl) -> Result<BinaryModule, CodegenError> {
    let mut builder = ModuleBuilder::new(&decl.name);

    for (tag, variant) in decl.variants.iter().enumerate() {
        let has_payload = variant.payload.is_some();
        let argc = if has_payload { 1 } else { 0 };
        let mut constructor = FunctionCode::new(&variant.name, argc);
        constructor.max_slots = argc as u16;
        if has_payload {
            constructor.emit(Instruction::LoadRef(0));
        }
        constructor.emit(Instruction::NewUnion {
            type_name: decl.name.clone(),
            tag: tag as u8,
            has_payload,
        });
        constructor.emit(Instruction::ReturnValue);
        builder.add_function(constructor);
    }

    builder.add_function(to_string_function(decl));
    builder.finish()
}

fn to_string_function(decl: &EnumDecl) -> FunctionCode {
    let mut function = FunctionCode::new("to_string", 1);
    function.max_slots = 1;

    let labels: Vec<_> = decl.variants.iter().map(|_| function.new_label()).collect();
    function.emit(Instruction::LoadRef(0));
    function.emit(Instruction::GetTag);
    function.emit(Instruction::JumpTable(labels.clone()));
    function.emit(Instruction::Trap(format!("invalid tag for {}", decl.name)));

    for (tag, (variant, label)) in decl.variants.iter().zip(labels).enumerate() {
        function.mark(label);
        if variant.payload.is_some() {
            function.emit(Instruction::PushStr(format!("{}(", variant.name)));
            function.emit(Instruction::LoadRef(0));
            function.emit(Instruction::GetPayload(tag as u8));
            function.emit(Instruction::AnyToStr);
            function.emit(Instruction::Concat);
            function.emit(Instruction::PushStr(String::from(")")));
            function.emit(Instruction::Concat);
        } else {
            function.emit(Instruction::PushStr(variant.name.clone()));
        }
        function.emit(Instruction::ReturnValue);
    }

    function
}

/// The two built-in generic wrappers, declared exactly as the checker
/// pre-registers them.
pub fn builtin_unions() -> Vec<EnumDecl> {
    use crate::parsing::{TypeName, VariantDecl};
    vec![
        EnumDecl {
            name: String::from("Option"),
            variants: vec![
                VariantDecl {
                    name: String::from("Some"),
                    payload: Some(TypeName::Named(String::from("Any"))),
                },
                VariantDecl {
                    name: String::from("None"),
                    payload: None,
                },
            ],
        },
        EnumDecl {
            name: String::from("Result"),
            variants: vec![
                VariantDecl {
                    name: String::from("Ok"),
                    payload: Some(TypeName::Named(String::from("Any"))),
                },
                VariantDecl {
                    name: String::from("Err"),
                    payload: Some(TypeName::Named(String::from("Any"))),
                },
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::module::MODULE_MAGIC;

    #[test]
    fn option_module_encodes_with_magic() {
        let decls = builtin_unions();
        let module = emit_tagged_union(&decls[0]).unwrap();
        assert_eq!(module.name, "Option");
        assert_eq!(&module.bytes[..4], MODULE_MAGIC);
    }
}
