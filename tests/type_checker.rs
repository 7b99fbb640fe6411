mod common;
use common::*;

// Well-typed programs

#[test]
fn arithmetic_and_control_flow() {
    assert_checks(
        "fn main() {\n\
         let mut total = 0;\n\
         for i in 0..10 {\n\
             if i > 5 { total += i; }\n\
         }\n\
         while total > 0 { total -= 1; }\n\
         print(total);\n\
         }",
    );
}

#[test]
fn structs_and_field_access() {
    assert_checks(
        "struct Point { x: i32, y: i32 }\n\
         fn main() {\n\
         let p = Point { x: 1, y: 2 };\n\
         print(p.x + p.y);\n\
         }",
    );
}

#[test]
fn enums_with_exhaustive_match() {
    assert_checks(
        "enum Shape { Dot, Line(i32) }\n\
         fn main() {\n\
         let s = Shape::Line(4);\n\
         let len = match s {\n\
             Shape::Dot => 0,\n\
             Shape::Line(n) => n,\n\
         };\n\
         print(len);\n\
         }",
    );
}

#[test]
fn option_with_if_let() {
    assert_checks(
        "fn lookup() -> Option<i32> { return Option::Some(4); }\n\
         fn main() {\n\
         if let Option::Some(v) = lookup() {\n\
             print(v);\n\
         } else {\n\
             print(0);\n\
         }\n\
         }",
    );
}

#[test]
fn option_match_covers_both_variants() {
    assert_checks(
        "fn lookup() -> Option<i32> { return Option::Some(4); }\n\
         fn main() {\n\
         let v = match lookup() {\n\
             Option::Some(v) => v,\n\
             Option::None => 0,\n\
         };\n\
         print(v);\n\
         }",
    );
}

#[test]
fn option_match_missing_none_warns() {
    assert_check_warning(
        "fn lookup() -> Option<i32> { return Option::Some(4); }\n\
         fn main() {\n\
         let v = match lookup() {\n\
             Option::Some(v) => v,\n\
         };\n\
         print(v);\n\
         }",
        "match expression is non-exhaustive (missing Option::None)",
    );
}

#[test]
fn shared_borrow_and_deref() {
    assert_checks(
        "fn main() {\n\
         let x = 4;\n\
         let r = &x;\n\
         print(*r);\n\
         }",
    );
}

#[test]
fn by_reference_argument_does_not_move() {
    assert_checks(
        "struct Point { x: i32, y: i32 }\n\
         fn show(p: &Point) { print((*p).x); }\n\
         fn main() {\n\
         let p = Point { x: 1, y: 2 };\n\
         show(&p);\n\
         show(&p);\n\
         }",
    );
}

#[test]
fn loop_expression_with_break_value() {
    assert_checks(
        "fn main() {\n\
         let mut n = 0;\n\
         let found = loop {\n\
             n += 1;\n\
             if n > 10 { break n; }\n\
         };\n\
         print(found);\n\
         }",
    );
}

#[test]
fn labeled_break_crosses_nested_loops() {
    assert_checks(
        "fn main() {\n\
         'outer: for i in 0..10 {\n\
             for j in 0..10 {\n\
                 if i + j > 12 { break 'outer; }\n\
             }\n\
         }\n\
         }",
    );
}

#[test]
fn copy_types_are_not_moved() {
    assert_checks(
        "fn take(n: i32) { print(n); }\n\
         fn main() {\n\
         let n = 4;\n\
         take(n);\n\
         take(n);\n\
         }",
    );
}

// Rejected programs

#[test]
fn unknown_identifier() {
    assert_check_error("fn main() { print(nope); }", "Unknown identifier: nope");
}

#[test]
fn let_type_mismatch() {
    assert_check_error(
        "fn main() { let x: bool = 4; }",
        "Type mismatch in let binding 'x': expected Bool got Int",
    );
}

#[test]
fn assignment_to_immutable() {
    assert_check_error(
        "fn main() { let x = 4; x = 5; }",
        "Cannot assign to immutable variable: x",
    );
}

#[test]
fn if_condition_must_be_bool() {
    assert_check_error("fn main() { if 4 { print(1); } }", "if condition must be bool");
}

#[test]
fn non_void_function_must_return() {
    assert_check_error(
        "fn f(x: i32) -> i32 { if x > 0 { return 1; } }\n\
         fn main() { print(f(1)); }",
        "Non-void functions must return on all paths",
    );
}

#[test]
fn return_type_mismatch() {
    assert_check_error(
        "fn f() -> i32 { return true; }\nfn main() { print(f()); }",
        "return type mismatch: expected Int got Bool",
    );
}

#[test]
fn wrong_argument_count() {
    assert_check_error(
        "fn f(a: i32, b: i32) { print(a + b); }\nfn main() { f(1); }",
        "Function 'f' expects 2 arguments",
    );
}

#[test]
fn wrong_argument_type() {
    assert_check_error(
        "fn f(a: i32) { print(a); }\nfn main() { f(true); }",
        "Argument 1 of 'f' expected Int got Bool",
    );
}

#[test]
fn missing_struct_field() {
    assert_check_error(
        "struct Point { x: i32, y: i32 }\n\
         fn main() { let p = Point { x: 1 }; }",
        "Missing field 'y' for struct Point",
    );
}

#[test]
fn use_after_move() {
    assert_check_error(
        "struct Point { x: i32, y: i32 }\n\
         fn take(p: Point) { print(p.x); }\n\
         fn main() {\n\
         let p = Point { x: 1, y: 2 };\n\
         take(p);\n\
         take(p);\n\
         }",
        "Use of moved value: p",
    );
}

#[test]
fn move_to_new_binding_poisons_source() {
    assert_check_error(
        "struct Point { x: i32, y: i32 }\n\
         fn main() {\n\
         let p = Point { x: 1, y: 2 };\n\
         let q = p;\n\
         print(p.x);\n\
         }",
        "Use of moved value: p",
    );
}

#[test]
fn conditional_move_counts_as_move() {
    assert_check_error(
        "struct Point { x: i32, y: i32 }\n\
         fn take(p: Point) { print(p.x); }\n\
         fn main() {\n\
         let p = Point { x: 1, y: 2 };\n\
         if true { take(p); }\n\
         print(p.x);\n\
         }",
        "Use of moved value: p",
    );
}

#[test]
fn mutable_borrow_conflicts_with_shared() {
    assert_check_error(
        "fn main() {\n\
         let mut x = 4;\n\
         let r = &x;\n\
         let m = &mut x;\n\
         print(*r);\n\
         }",
        "Cannot take mutable borrow of 'x' because it is already borrowed",
    );
}

#[test]
fn shared_borrow_conflicts_with_mutable() {
    assert_check_error(
        "fn main() {\n\
         let mut x = 4;\n\
         let m = &mut x;\n\
         let r = &x;\n\
         print(*m);\n\
         }",
        "Cannot take shared borrow of 'x' while a mutable borrow is active",
    );
}

#[test]
fn assignment_blocked_while_borrowed() {
    assert_check_error(
        "fn main() {\n\
         let mut x = 4;\n\
         let r = &x;\n\
         x = 5;\n\
         print(*r);\n\
         }",
        "Cannot assign to 'x' while it is borrowed",
    );
}

#[test]
fn rebinding_releases_loan() {
    assert_checks(
        "fn main() {\n\
         let mut x = 4;\n\
         let m = &mut x;\n\
         let m = 0;\n\
         let r = &x;\n\
         print(*r + m);\n\
         }",
    );
}

#[test]
fn cannot_move_while_borrowed() {
    assert_check_error(
        "struct Point { x: i32, y: i32 }\n\
         fn take(p: Point) { print(p.x); }\n\
         fn main() {\n\
         let p = Point { x: 1, y: 2 };\n\
         let r = &p;\n\
         take(p);\n\
         print((*r).x);\n\
         }",
        "Cannot move 'p' while it is borrowed",
    );
}

#[test]
fn borrow_released_at_scope_exit() {
    assert_checks(
        "fn main() {\n\
         let mut x = 4;\n\
         if true {\n\
             let r = &x;\n\
             print(*r);\n\
         }\n\
         let m = &mut x;\n\
         print(*m);\n\
         }",
    );
}

#[test]
fn mutable_borrow_of_immutable_binding() {
    assert_check_error(
        "fn main() {\n\
         let x = 4;\n\
         let m = &mut x;\n\
         print(*m);\n\
         }",
        "Cannot take mutable borrow of immutable variable: x",
    );
}

#[test]
fn break_outside_loop() {
    assert_check_error("fn main() { break; }", "break is only valid inside loops");
}

#[test]
fn unknown_loop_label() {
    assert_check_error(
        "fn main() { while true { break 'nope; } }",
        "Unknown loop label 'nope'",
    );
}

#[test]
fn break_value_outside_loop_expression() {
    assert_check_error(
        "fn main() { while true { break 4; } }",
        "break with value is only allowed in loop expressions",
    );
}

#[test]
fn match_arms_must_agree() {
    assert_check_error(
        "fn main() {\n\
         let x = match 4 {\n\
             0 => 1,\n\
             _ => true,\n\
         };\n\
         }",
        "match arms must return the same type",
    );
}

#[test]
fn wildcard_must_be_last() {
    assert_check_error(
        "fn main() {\n\
         let x = match 4 {\n\
             _ => 0,\n\
             1 => 1,\n\
         };\n\
         print(x);\n\
         }",
        "wildcard '_' must be the last match arm",
    );
}

// Exhaustiveness warnings

#[test]
fn missing_variant_is_named() {
    assert_check_warning(
        "enum Shape { Dot, Line(i32), Arc(i32) }\n\
         fn main() {\n\
         let s = Shape::Dot;\n\
         let n = match s {\n\
             Shape::Dot => 0,\n\
             Shape::Line(v) => v,\n\
         };\n\
         print(n);\n\
         }",
        "warning: match expression is non-exhaustive (missing Shape::Arc)",
    );
}

#[test]
fn guarded_arm_does_not_count_as_coverage() {
    assert_check_warning(
        "enum Shape { Dot, Line(i32) }\n\
         fn main() {\n\
         let s = Shape::Line(4);\n\
         let n = match s {\n\
             Shape::Dot => 0,\n\
             Shape::Line(v) if v > 2 => v,\n\
         };\n\
         print(n);\n\
         }",
        "warning: match expression is non-exhaustive (missing Shape::Line)",
    );
}

#[test]
fn int_match_without_wildcard_warns() {
    assert_check_warning(
        "fn main() {\n\
         let n = match 4 {\n\
             0 => 1,\n\
             1 => 2,\n\
         };\n\
         print(n);\n\
         }",
        "warning: match expression is non-exhaustive (missing '_')",
    );
}
