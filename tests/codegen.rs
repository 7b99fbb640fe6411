use vela::codegen::{Codegen, CodegenError, MODULE_MAGIC};

mod common;
use common::*;

fn emit(text: &str) -> Result<vela::codegen::CodegenOutput, CodegenError> {
    let (items, diagnostics) = parse(text);
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
    Codegen::emit(&items, "app")
}

#[test]
fn entry_module_comes_first_and_carries_magic() {
    let output = emit("fn main() { std::print(1 + 2); return; }").unwrap();
    assert_eq!(output.entry, "app");
    assert_eq!(output.modules[0].name, "app");
    for module in &output.modules {
        assert_eq!(&module.bytes[0..4], MODULE_MAGIC);
    }
    // The int-typed print opcode must appear in the emitted code.
    assert!(output.modules[0]
        .bytes
        .contains(&vela::codegen::Instruction::PrintInt.opcode()));
}

#[test]
fn builtin_unions_are_always_emitted() {
    let output = emit("fn main() { }").unwrap();
    let names: Vec<&str> = output
        .modules
        .iter()
        .map(|module| module.name.as_str())
        .collect();
    assert!(names.contains(&"Option"), "modules were: {:?}", names);
    assert!(names.contains(&"Result"), "modules were: {:?}", names);
}

#[test]
fn user_enum_gets_its_own_module() {
    let output = emit(
        "enum Shape { Dot, Line(i32) }\n\
         fn main() {\n\
         let s = Shape::Line(4);\n\
         let n = match s {\n\
             Shape::Dot => 0,\n\
             Shape::Line(v) => v,\n\
         };\n\
         print(n);\n\
         }",
    )
    .unwrap();
    assert!(output
        .modules
        .iter()
        .any(|module| module.name == "Shape"));
}

#[test]
fn full_language_program_emits() {
    let output = emit(
        "struct Point { x: i32, y: i32 }\n\
         fn dist(p: &Point) -> i32 { return (*p).x + (*p).y; }\n\
         fn main() {\n\
         let p = Point { x: 3, y: 4 };\n\
         let mut total = 0;\n\
         'outer: for i in 0..=3 {\n\
             while total < 100 {\n\
                 total += dist(&p);\n\
                 if total > 20 { break 'outer; }\n\
             }\n\
         }\n\
         let label = if total > 20 { \"big\" } else { \"small\" };\n\
         print(label);\n\
         let found = loop { break total; };\n\
         print(found);\n\
         }",
    )
    .unwrap();
    assert!(!output.modules[0].bytes.is_empty());
}

#[test]
fn missing_main_is_rejected() {
    let error = emit("fn helper() { }").unwrap_err();
    assert!(matches!(error, CodegenError::MissingMain));
    assert_eq!(error.to_string(), "no main function defined");
}

#[test]
fn main_with_parameters_is_rejected() {
    let error = emit("fn main(n: i32) { print(n); }").unwrap_err();
    assert!(matches!(error, CodegenError::MainSignature));
}
