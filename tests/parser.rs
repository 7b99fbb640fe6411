use vela::parsing::{BinaryOp, Expr, ItemKind, Pattern, Stmt, TypeName, UnaryOp};

mod common;
use common::*;

fn parse_ok(text: &str) -> Vec<vela::parsing::Item> {
    let (items, diagnostics) = parse(text);
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
    items
}

fn main_body(text: &str) -> Vec<Stmt> {
    let items = parse_ok(text);
    for item in items {
        if let ItemKind::Function(decl) = item.kind {
            if decl.name == "main" {
                return decl.body;
            }
        }
    }
    panic!("no main function in parsed items");
}

#[test]
fn function_with_params_and_return_type() {
    let items = parse_ok("fn add(a: i32, b: i32) -> i32 { return a + b; }");
    let decl = match &items[0].kind {
        ItemKind::Function(decl) => decl,
        other => panic!("expected function, got {:?}", other),
    };
    assert_eq!(decl.name, "add");
    assert_eq!(decl.params.len(), 2);
    assert_eq!(decl.params[0].name, "a");
    assert_eq!(
        decl.return_type,
        Some(TypeName::Named(String::from("i32")))
    );
}

#[test]
fn struct_and_enum_decls() {
    let items = parse_ok(
        "struct Point { x: i32, y: i32 }\n\
         enum Shape { Dot, Line(i32) }",
    );
    match &items[0].kind {
        ItemKind::Struct(decl) => {
            assert_eq!(decl.name, "Point");
            assert_eq!(decl.fields.len(), 2);
        }
        other => panic!("expected struct, got {:?}", other),
    }
    match &items[1].kind {
        ItemKind::Enum(decl) => {
            assert_eq!(decl.variants[0].name, "Dot");
            assert!(decl.variants[0].payload.is_none());
            assert!(decl.variants[1].payload.is_some());
        }
        other => panic!("expected enum, got {:?}", other),
    }
}

#[test]
fn import_and_mod_items() {
    let items = parse_ok("import \"util.vela\";\nmod helpers::math;\nfn main() { }");
    match &items[0].kind {
        ItemKind::Import(path) => assert_eq!(path, "util.vela"),
        other => panic!("expected import, got {:?}", other),
    }
    match &items[1].kind {
        ItemKind::ModDecl(path) => {
            assert_eq!(path, &[String::from("helpers"), String::from("math")]);
        }
        other => panic!("expected mod declaration, got {:?}", other),
    }
}

#[test]
fn precedence_mul_binds_tighter_than_add() {
    let body = main_body("fn main() { let x = 1 + 2 * 3; }");
    let value = match &body[0] {
        Stmt::Let { value, .. } => value,
        other => panic!("expected let, got {:?}", other),
    };
    match value {
        Expr::Binary { op, right, .. } => {
            assert_eq!(*op, BinaryOp::Add);
            assert!(matches!(
                **right,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            ));
        }
        other => panic!("expected binary, got {:?}", other),
    }
}

#[test]
fn unary_prefixes_chain() {
    let body = main_body("fn main() { let x = !*&y; }");
    let value = match &body[0] {
        Stmt::Let { value, .. } => value,
        other => panic!("expected let, got {:?}", other),
    };
    match value {
        Expr::Unary {
            op: UnaryOp::Not,
            expr,
        } => match &**expr {
            Expr::Unary {
                op: UnaryOp::Deref,
                expr,
            } => assert!(matches!(
                **expr,
                Expr::Unary {
                    op: UnaryOp::Ref { mutable: false },
                    ..
                }
            )),
            other => panic!("expected deref, got {:?}", other),
        },
        other => panic!("expected not, got {:?}", other),
    }
}

#[test]
fn struct_init_suppressed_in_condition() {
    // `p { }` after `if` must parse as identifier-then-block, not as a
    // struct literal.
    let body = main_body("fn main() { if ready { print(1); } }");
    match &body[0] {
        Stmt::If { condition, .. } => match &**condition {
            Expr::Identifier(name) => assert_eq!(name, "ready"),
            other => panic!("expected identifier, got {:?}", other),
        },
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn parenthesized_condition_allows_struct_init() {
    let body = main_body("fn main() { if (Point { x: 1, y: 2 }).ok { print(1); } }");
    match &body[0] {
        Stmt::If { condition, .. } => {
            assert!(matches!(**condition, Expr::FieldAccess { .. }));
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn labeled_loops_and_breaks() {
    let body = main_body(
        "fn main() {\n\
         'outer: while true {\n\
             loop { break 'outer; }\n\
         }\n\
         }",
    );
    match &body[0] {
        Stmt::While { label, body, .. } => {
            assert_eq!(label.as_deref(), Some("outer"));
            match &body[0] {
                Stmt::Loop { body, .. } => match &body[0] {
                    Stmt::Break { label, value } => {
                        assert_eq!(label.as_deref(), Some("outer"));
                        assert!(value.is_none());
                    }
                    other => panic!("expected break, got {:?}", other),
                },
                other => panic!("expected loop, got {:?}", other),
            }
        }
        other => panic!("expected while, got {:?}", other),
    }
}

#[test]
fn for_range_statement() {
    let body = main_body("fn main() { for i in 0..=9 { print(i); } }");
    match &body[0] {
        Stmt::For {
            binding, inclusive, ..
        } => {
            assert_eq!(binding, "i");
            assert!(*inclusive);
        }
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn match_expression_with_guard_and_ranges() {
    let body = main_body(
        "fn main() {\n\
         let x = match n {\n\
             0 if n > 1 => 10,\n\
             1..5 => 20,\n\
             _ => 40,\n\
         };\n\
         }",
    );
    let arms = match &body[0] {
        Stmt::Let { value, .. } => match value {
            Expr::Match { arms, .. } => arms,
            other => panic!("expected match, got {:?}", other),
        },
        other => panic!("expected let, got {:?}", other),
    };
    assert_eq!(arms.len(), 3);
    assert_eq!(arms[0].pattern, Pattern::Int(0));
    assert!(arms[0].guard.is_some());
    assert_eq!(
        arms[1].pattern,
        Pattern::Range {
            start: 1,
            end: 5,
            inclusive: false
        }
    );
    assert_eq!(arms[2].pattern, Pattern::Wildcard);
}

#[test]
fn variant_pattern_with_binding() {
    let body = main_body(
        "fn main() {\n\
         if let Option::Some(v) = lookup() { print(v); }\n\
         }",
    );
    match &body[0] {
        Stmt::IfLet { pattern, .. } => {
            assert_eq!(
                *pattern,
                Pattern::Variant {
                    enum_name: String::from("Option"),
                    variant: String::from("Some"),
                    binding: Some(String::from("v")),
                }
            );
        }
        other => panic!("expected if-let, got {:?}", other),
    }
}

#[test]
fn reference_types() {
    let items = parse_ok("fn f(a: &i32, b: &mut Point) { }");
    let decl = match &items[0].kind {
        ItemKind::Function(decl) => decl,
        other => panic!("expected function, got {:?}", other),
    };
    assert_eq!(
        decl.params[0].type_name,
        TypeName::Reference {
            inner: Box::new(TypeName::Named(String::from("i32"))),
            mutable: false
        }
    );
    assert_eq!(
        decl.params[1].type_name,
        TypeName::Reference {
            inner: Box::new(TypeName::Named(String::from("Point"))),
            mutable: true
        }
    );
}

#[test]
fn number_out_of_range() {
    let (_, diagnostics) = parse("fn main() { let x = 99999999999; }");
    assert_has_message(&diagnostics, "Number literal out of range");
}

#[test]
fn block_expression_needs_trailing_value() {
    let (_, diagnostics) = parse("fn main() { let x = if c { print(1); } else { 2 }; }");
    assert_has_message(&diagnostics, "Block expression must end with a value");
}

#[test]
fn error_carries_position() {
    let (_, diagnostics) = parse("fn main() { let = 4; }");
    assert!(
        diagnostics
            .iter()
            .any(|diagnostic| diagnostic.message.contains("at 1:")),
        "no positioned diagnostic in {:?}",
        diagnostics
    );
}
