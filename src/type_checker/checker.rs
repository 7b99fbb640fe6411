use super::borrow::{BorrowCheck, BorrowTracker};
use super::node_type::{is_assignable, NodeType};
use super::registry::{EnumRegistry, FunctionRegistry, FunctionSig, StructRegistry};
use super::scope::{LoopContext, TypeEnvironment};
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::parsing::{Expr, FunctionDecl, Item, ItemKind, Pattern, Stmt, TypeName, UnaryOp};
use log::trace;
use std::collections::HashSet;
use std::path::PathBuf;

/// Checks every item of a program in one pass over the concatenated item
/// list, so a function in one file can freely reference types and functions
/// declared in another. Each item carries its source, which attributes
/// diagnostics to the right file.
pub struct TypeChecker<'a> {
    structs: StructRegistry,
    enums: EnumRegistry,
    functions: FunctionRegistry,
    diagnostics: &'a mut Diagnostics,
    current_return_type: NodeType,
    current_path: PathBuf,
    loop_stack: Vec<LoopContext>,
    borrows: BorrowTracker,
}

impl<'a> TypeChecker<'a> {
    pub fn check(items: &[Item], diagnostics: &'a mut Diagnostics) -> bool {
        let mut checker = TypeChecker {
            structs: StructRegistry::new(),
            enums: EnumRegistry::with_builtins(),
            functions: FunctionRegistry::new(),
            diagnostics,
            current_return_type: NodeType::Void,
            current_path: PathBuf::new(),
            loop_stack: Vec::new(),
            borrows: BorrowTracker::new(),
        };
        checker.run(items)
    }

    fn run(&mut self, items: &[Item]) -> bool {
        let mut success = true;

        for item in items {
            self.current_path = item.source.path.clone();
            match &item.kind {
                ItemKind::Struct(decl) => self.structs.register(decl.clone()),
                ItemKind::Enum(decl) => {
                    if self.enums.contains(&decl.name) {
                        self.error(format!(
                            "Enum name is reserved or already defined: {}",
                            decl.name
                        ));
                        success = false;
                        continue;
                    }
                    self.enums.register(decl.clone());
                }
                _ => {}
            }
        }

        for item in items {
            self.current_path = item.source.path.clone();
            if let ItemKind::Function(decl) = &item.kind {
                if !self.register_function(decl) {
                    success = false;
                }
            }
        }

        for item in items {
            self.current_path = item.source.path.clone();
            if let ItemKind::Function(decl) = &item.kind {
                trace!(target: "type_checker", "Checking function {}", decl.name);
                if !self.check_function(decl) {
                    success = false;
                }
            }
        }

        success
    }

    fn register_function(&mut self, decl: &FunctionDecl) -> bool {
        let mut success = true;
        if self.functions.contains(&decl.name) {
            self.error(format!("Duplicate function: {}", decl.name));
            return false;
        }

        if decl.name == "main" && !decl.params.is_empty() {
            self.error("main does not accept parameters");
            success = false;
        }

        let mut param_types = Vec::new();
        for param in &decl.params {
            let param_type = self.resolve_type_name(&param.type_name);
            if param_type == NodeType::Unknown {
                self.error(format!("Unknown parameter type: {}", param.type_name));
                success = false;
                param_types.push(NodeType::Unknown);
                continue;
            }
            if param_type == NodeType::Void {
                self.error("Parameter type cannot be void");
                success = false;
                param_types.push(NodeType::Unknown);
                continue;
            }
            param_types.push(param_type);
        }

        let return_type = self.resolve_return_type(decl.return_type.as_ref());
        if return_type == NodeType::Unknown {
            success = false;
        }
        if decl.name == "main" && return_type != NodeType::Void {
            self.error("main must return void");
            success = false;
        }

        self.functions.register(FunctionSig {
            name: decl.name.clone(),
            return_type,
            param_types,
        });
        success
    }

    fn check_function(&mut self, decl: &FunctionDecl) -> bool {
        let mut success = true;
        let expected_return = self.resolve_return_type(decl.return_type.as_ref());
        if expected_return == NodeType::Unknown {
            return false;
        }

        let sig = match self.functions.find(&decl.name).cloned() {
            Some(sig) => sig,
            None => {
                self.error(format!("Unknown function signature for {}", decl.name));
                return false;
            }
        };

        let mut locals = TypeEnvironment::new();
        for (param, param_type) in decl.params.iter().zip(sig.param_types.iter()) {
            locals.define(&param.name, param_type.clone(), param.mutable);
        }

        let previous_return = std::mem::replace(&mut self.current_return_type, expected_return.clone());
        let previous_borrows = std::mem::replace(&mut self.borrows, BorrowTracker::new());
        if !self.check_block(&decl.body, &mut locals, &expected_return) {
            success = false;
        }
        self.current_return_type = previous_return;
        self.borrows = previous_borrows;

        if expected_return != NodeType::Void && !always_returns(&decl.body) {
            self.error("Non-void functions must return on all paths");
            success = false;
        }

        success
    }

    fn check_block(
        &mut self,
        statements: &[Stmt],
        locals: &mut TypeEnvironment,
        expected_return: &NodeType,
    ) -> bool {
        let mut success = true;
        self.borrows.enter_scope();
        for stmt in statements {
            if !self.check_stmt(stmt, locals, expected_return) {
                success = false;
            }
        }
        self.borrows.exit_scope();
        success
    }

    fn check_stmt(
        &mut self,
        stmt: &Stmt,
        locals: &mut TypeEnvironment,
        expected_return: &NodeType,
    ) -> bool {
        match stmt {
            Stmt::Let {
                name,
                mutable,
                type_name,
                value,
            } => self.check_let(name, *mutable, type_name.as_ref(), value, locals),
            Stmt::Assign { name, op, value } => self.check_assign(name, *op, value, locals),
            Stmt::Expression(expr) => self.infer_expr(expr, locals) != NodeType::Unknown,
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut success = true;
                let cond_type = self.infer_expr(condition, locals);
                if cond_type != NodeType::Bool {
                    self.error("if condition must be bool");
                    success = false;
                }
                let mut then_locals = locals.fork();
                if !self.check_block(then_branch, &mut then_locals, expected_return) {
                    success = false;
                }
                if let Some(else_branch) = else_branch {
                    let mut else_locals = locals.fork();
                    if !self.check_block(else_branch, &mut else_locals, expected_return) {
                        success = false;
                    }
                    locals.join_moved_from(&then_locals, &else_locals);
                } else {
                    locals.merge_moved_from(&then_locals);
                }
                success
            }
            Stmt::IfLet {
                pattern,
                target,
                then_branch,
                else_branch,
            } => self.check_if_let(pattern, target, then_branch, else_branch.as_deref(), locals, expected_return),
            Stmt::While {
                label,
                condition,
                body,
            } => {
                let mut success = true;
                let cond_type = self.infer_expr(condition, locals);
                if cond_type != NodeType::Bool {
                    self.error("while condition must be bool");
                    success = false;
                }
                let mut loop_locals = locals.fork();
                self.loop_stack.push(LoopContext::statement(label.clone()));
                if !self.check_block(body, &mut loop_locals, expected_return) {
                    success = false;
                }
                self.loop_stack.pop();
                locals.merge_moved_from(&loop_locals);
                success
            }
            Stmt::WhileLet {
                label,
                pattern,
                target,
                body,
            } => self.check_while_let(label.clone(), pattern, target, body, locals, expected_return),
            Stmt::For {
                label,
                binding,
                start,
                end,
                inclusive: _,
                body,
            } => {
                let mut success = true;
                let start_type = self.infer_expr(start, locals);
                let end_type = self.infer_expr(end, locals);
                if start_type != NodeType::Int || end_type != NodeType::Int {
                    self.error("for loop bounds must be int");
                    success = false;
                }
                let mut loop_locals = locals.fork();
                loop_locals.define(binding, NodeType::Int, false);
                self.loop_stack.push(LoopContext::statement(label.clone()));
                if !self.check_block(body, &mut loop_locals, expected_return) {
                    success = false;
                }
                self.loop_stack.pop();
                locals.merge_moved_from(&loop_locals);
                success
            }
            Stmt::Loop { label, body } => {
                let mut success = true;
                let mut loop_locals = locals.fork();
                self.loop_stack.push(LoopContext::statement(label.clone()));
                if !self.check_block(body, &mut loop_locals, expected_return) {
                    success = false;
                }
                self.loop_stack.pop();
                locals.merge_moved_from(&loop_locals);
                success
            }
            Stmt::Break { label, value } => self.check_break(label.as_deref(), value.as_ref(), locals),
            Stmt::Continue { label } => self.check_continue(label.as_deref()),
            Stmt::Return(value) => {
                if *expected_return == NodeType::Void {
                    if value.is_some() {
                        self.error("return with value in void function");
                        return false;
                    }
                    return true;
                }
                let value = match value {
                    Some(value) => value,
                    None => {
                        self.error("return without value in non-void function");
                        return false;
                    }
                };
                let expr_type = self.infer_expr(value, locals);
                if !is_assignable(expected_return, &expr_type) {
                    self.error(format!(
                        "return type mismatch: expected {} got {}",
                        expected_return, expr_type
                    ));
                    return false;
                }
                true
            }
        }
    }

    fn check_let(
        &mut self,
        name: &str,
        mutable: bool,
        type_name: Option<&TypeName>,
        value: &Expr,
        locals: &mut TypeEnvironment,
    ) -> bool {
        let declared_type = match type_name {
            Some(type_name) => {
                let declared = self.resolve_type_name(type_name);
                if declared == NodeType::Unknown {
                    self.error(format!("Unknown type: {}", type_name));
                    return false;
                }
                if declared == NodeType::Void {
                    self.error("let type cannot be void");
                    return false;
                }
                Some(declared)
            }
            None => None,
        };
        let expr_type = self.infer_expr(value, locals);
        if expr_type == NodeType::Unknown {
            return false;
        }
        if expr_type == NodeType::Void {
            self.error("let initializer cannot be void");
            return false;
        }
        if let Some(declared) = &declared_type {
            if !is_assignable(declared, &expr_type) {
                self.error(format!(
                    "Type mismatch in let binding '{}': expected {} got {}",
                    name, declared, expr_type
                ));
                return false;
            }
        }
        if !self.consume_move_candidate(value, &expr_type, locals) {
            return false;
        }
        let final_type = declared_type.unwrap_or(expr_type);
        self.borrows.release_binding(name);
        locals.define(name, final_type, mutable);
        self.register_persistent_borrow(name, value, locals)
    }

    fn check_assign(
        &mut self,
        name: &str,
        op: crate::parsing::AssignOp,
        value: &Expr,
        locals: &mut TypeEnvironment,
    ) -> bool {
        let (binding_type, binding_mutable, binding_moved) = match locals.lookup(name) {
            Some(binding) => (binding.node_type.clone(), binding.mutable, binding.moved),
            None => {
                self.error(format!("Unknown identifier: {}", name));
                return false;
            }
        };
        if binding_moved && op.is_compound() {
            self.error(format!("Use of moved value: {}", name));
            return false;
        }
        if !binding_mutable {
            self.error(format!("Cannot assign to immutable variable: {}", name));
            return false;
        }
        if !self.validate_borrow_operation(self.borrows.validate_assignment(name)) {
            return false;
        }
        let value_type = self.infer_expr(value, locals);
        if value_type == NodeType::Unknown {
            return false;
        }
        if value_type == NodeType::Void {
            self.error("assignment value cannot be void");
            return false;
        }
        if op.is_compound() {
            if binding_type != NodeType::Int || value_type != NodeType::Int {
                self.error("Compound assignment requires int operands");
                return false;
            }
            return true;
        }
        if !is_assignable(&binding_type, &value_type) {
            self.error(format!("Type mismatch in assignment to {}", name));
            return false;
        }
        if !self.consume_move_candidate(value, &value_type, locals) {
            return false;
        }
        if binding_type.is_reference() {
            self.borrows.release_binding(name);
            if !self.register_persistent_borrow(name, value, locals) {
                return false;
            }
        }
        locals.clear_moved(name);
        true
    }

    fn check_if_let(
        &mut self,
        pattern: &Pattern,
        target: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&[Stmt]>,
        locals: &mut TypeEnvironment,
        expected_return: &NodeType,
    ) -> bool {
        let target_type = self.infer_expr(target, locals);
        if target_type == NodeType::Unknown {
            return false;
        }
        if !self.pattern_matches_type(pattern, &target_type) {
            self.error("if let pattern does not match target type");
            return false;
        }
        let mut then_locals = locals.fork();
        if matches!(pattern, Pattern::Variant { .. })
            && !self.bind_enum_pattern(pattern, &target_type, &mut then_locals)
        {
            return false;
        }
        let mut success = self.check_block(then_branch, &mut then_locals, expected_return);
        if let Some(else_branch) = else_branch {
            let mut else_locals = locals.fork();
            if !self.check_block(else_branch, &mut else_locals, expected_return) {
                success = false;
            }
            locals.join_moved_from(&then_locals, &else_locals);
        } else {
            locals.merge_moved_from(&then_locals);
        }
        success
    }

    fn check_while_let(
        &mut self,
        label: Option<String>,
        pattern: &Pattern,
        target: &Expr,
        body: &[Stmt],
        locals: &mut TypeEnvironment,
        expected_return: &NodeType,
    ) -> bool {
        let target_type = self.infer_expr(target, locals);
        if target_type == NodeType::Unknown {
            return false;
        }
        if !self.pattern_matches_type(pattern, &target_type) {
            self.error("while let pattern does not match target type");
            return false;
        }
        let mut body_locals = locals.fork();
        if matches!(pattern, Pattern::Variant { .. })
            && !self.bind_enum_pattern(pattern, &target_type, &mut body_locals)
        {
            return false;
        }
        self.loop_stack.push(LoopContext::statement(label));
        let success = self.check_block(body, &mut body_locals, expected_return);
        self.loop_stack.pop();
        locals.merge_moved_from(&body_locals);
        success
    }

    fn check_break(
        &mut self,
        label: Option<&str>,
        value: Option<&Expr>,
        locals: &mut TypeEnvironment,
    ) -> bool {
        let index = match self.resolve_loop_context(label, "break") {
            Some(index) => index,
            None => return false,
        };
        let allows_value = self.loop_stack[index].allows_value;
        match value {
            Some(value) => {
                if !allows_value {
                    self.error("break with value is only allowed in loop expressions");
                    return false;
                }
                let value_type = self.infer_expr(value, locals);
                if value_type == NodeType::Unknown || value_type == NodeType::Void {
                    self.error("break value must be a non-void expression");
                    return false;
                }
                match &self.loop_stack[index].break_type {
                    None => {
                        self.loop_stack[index].break_type = Some(value_type);
                        true
                    }
                    Some(break_type) => {
                        if !is_assignable(break_type, &value_type) {
                            self.error("break values in loop expression must have the same type");
                            return false;
                        }
                        true
                    }
                }
            }
            None => {
                if allows_value {
                    self.error("break value required for loop expression");
                    return false;
                }
                true
            }
        }
    }

    fn check_continue(&mut self, label: Option<&str>) -> bool {
        self.resolve_loop_context(label, "continue").is_some()
    }

    fn resolve_loop_context(&mut self, label: Option<&str>, keyword: &str) -> Option<usize> {
        if self.loop_stack.is_empty() {
            self.error(format!("{} is only valid inside loops", keyword));
            return None;
        }
        match label {
            None => Some(self.loop_stack.len() - 1),
            Some(label) => {
                let found = self
                    .loop_stack
                    .iter()
                    .rposition(|context| context.label.as_deref() == Some(label));
                if found.is_none() {
                    self.error(format!("Unknown loop label '{}'", label));
                }
                found
            }
        }
    }

    // Expression inference

    pub(super) fn infer_expr(&mut self, expr: &Expr, locals: &mut TypeEnvironment) -> NodeType {
        match expr {
            Expr::Str(_) => NodeType::Str,
            Expr::Number(_) => NodeType::Int,
            Expr::Bool(_) => NodeType::Bool,
            Expr::Identifier(name) => match locals.lookup(name) {
                None => {
                    self.error(format!("Unknown identifier: {}", name));
                    NodeType::Unknown
                }
                Some(binding) => {
                    if binding.moved {
                        self.error(format!("Use of moved value: {}", name));
                        return NodeType::Unknown;
                    }
                    binding.node_type.clone()
                }
            },
            Expr::StructInit { name, fields } => self.infer_struct_init(name, fields, locals),
            Expr::FieldAccess { target, field } => {
                let target_type = self.infer_expr(target, locals);
                let struct_name = match target_type.struct_name() {
                    Some(struct_name) => struct_name.to_string(),
                    None => {
                        self.error(format!("Field access on non-struct type: {}", target_type));
                        return NodeType::Unknown;
                    }
                };
                let def = match self.structs.find(&struct_name).cloned() {
                    Some(def) => def,
                    None => {
                        self.error(format!("Unknown struct type: {}", struct_name));
                        return NodeType::Unknown;
                    }
                };
                match def.field(field) {
                    Some(field_decl) => self.resolve_type_name(&field_decl.type_name),
                    None => {
                        self.error(format!(
                            "Unknown field '{}' on struct {}",
                            field, def.name
                        ));
                        NodeType::Unknown
                    }
                }
            }
            Expr::Binary { left, op, right } => self.infer_binary(left, *op, right, locals),
            Expr::Unary { op, expr } => self.infer_unary(op, expr, locals),
            Expr::Call { callee, args } => self.infer_call(callee, args, locals),
            Expr::If {
                condition,
                then_expr,
                else_expr,
            } => {
                let cond_type = self.infer_expr(condition, locals);
                if cond_type != NodeType::Bool {
                    self.error("if expression condition must be bool");
                    return NodeType::Unknown;
                }
                let mut then_locals = locals.fork();
                let mut else_locals = locals.fork();
                let then_type = self.infer_expr(then_expr, &mut then_locals);
                let else_type = self.infer_expr(else_expr, &mut else_locals);
                locals.join_moved_from(&then_locals, &else_locals);
                if then_type == NodeType::Unknown || else_type == NodeType::Unknown {
                    return NodeType::Unknown;
                }
                if then_type != else_type {
                    self.error(format!(
                        "if expression branches must match: {} vs {}",
                        then_type, else_type
                    ));
                    return NodeType::Unknown;
                }
                if then_type == NodeType::Void {
                    self.error("if expression cannot be void");
                    return NodeType::Unknown;
                }
                then_type
            }
            Expr::Block { statements, value } => {
                let mut block_locals = locals.fork();
                let expected_return = self.current_return_type.clone();
                if !self.check_block(statements, &mut block_locals, &expected_return) {
                    return NodeType::Unknown;
                }
                let value_type = self.infer_expr(value, &mut block_locals);
                if value_type == NodeType::Void {
                    self.error("block expression cannot be void");
                    return NodeType::Unknown;
                }
                locals.adopt_moved_from(&block_locals);
                value_type
            }
            Expr::Loop { body } => {
                let mut loop_locals = locals.fork();
                let expected_return = self.current_return_type.clone();
                self.loop_stack.push(LoopContext::expression());
                if !self.check_block(body, &mut loop_locals, &expected_return) {
                    self.loop_stack.pop();
                    return NodeType::Unknown;
                }
                let context = self.loop_stack.pop();
                locals.merge_moved_from(&loop_locals);
                match context.and_then(|context| context.break_type) {
                    Some(break_type) => break_type,
                    None => {
                        self.error("loop expression requires break with value");
                        NodeType::Unknown
                    }
                }
            }
            Expr::Match { target, arms } => self.infer_match(target, arms, locals),
            Expr::Path(segments) => self.infer_path(segments),
        }
    }

    fn infer_struct_init(
        &mut self,
        name: &str,
        fields: &[crate::parsing::FieldInit],
        locals: &mut TypeEnvironment,
    ) -> NodeType {
        let def = match self.structs.find(name).cloned() {
            Some(def) => def,
            None => {
                self.error(format!("Unknown struct: {}", name));
                return NodeType::Unknown;
            }
        };
        for field in &def.fields {
            if !fields.iter().any(|f| f.name == field.name) {
                self.error(format!(
                    "Missing field '{}' for struct {}",
                    field.name, def.name
                ));
                return NodeType::Unknown;
            }
        }
        for field in fields {
            let target = match def.field(&field.name) {
                Some(target) => target.clone(),
                None => {
                    self.error(format!(
                        "Unknown field '{}' on struct {}",
                        field.name, def.name
                    ));
                    return NodeType::Unknown;
                }
            };
            let value_type = self.infer_expr(&field.value, locals);
            let field_type = self.resolve_type_name(&target.type_name);
            if field_type == NodeType::Unknown {
                self.error(format!("Unsupported field type: {}", target.type_name));
                return NodeType::Unknown;
            }
            if field_type != value_type {
                self.error(format!(
                    "Type mismatch for field '{}': expected {} got {}",
                    field.name, field_type, value_type
                ));
                return NodeType::Unknown;
            }
            if !self.consume_move_candidate(&field.value, &value_type, locals) {
                return NodeType::Unknown;
            }
        }
        NodeType::Struct(def.name)
    }

    fn infer_binary(
        &mut self,
        left: &Expr,
        op: crate::parsing::BinaryOp,
        right: &Expr,
        locals: &mut TypeEnvironment,
    ) -> NodeType {
        let left_type = self.infer_expr(left, locals);
        let right_type = self.infer_expr(right, locals);

        if op.is_arithmetic() {
            if left_type == NodeType::Int && right_type == NodeType::Int {
                return NodeType::Int;
            }
            self.error("Arithmetic operator requires int operands");
            return NodeType::Unknown;
        }
        if op.is_comparison() {
            if left_type == NodeType::Int && right_type == NodeType::Int {
                return NodeType::Bool;
            }
            self.error("Comparison operator requires int operands");
            return NodeType::Unknown;
        }
        if op.is_equality() {
            let comparable = matches!(
                left_type,
                NodeType::Int | NodeType::Bool | NodeType::Str | NodeType::Any
            ) || left_type.is_struct()
                || left_type.is_enum();
            if left_type == right_type && comparable {
                return NodeType::Bool;
            }
            self.error("Equality requires matching operand types");
            return NodeType::Unknown;
        }
        // Logical.
        if left_type == NodeType::Bool && right_type == NodeType::Bool {
            return NodeType::Bool;
        }
        self.error("Logical operator requires bool operands");
        NodeType::Unknown
    }

    fn infer_unary(
        &mut self,
        op: &UnaryOp,
        operand: &Expr,
        locals: &mut TypeEnvironment,
    ) -> NodeType {
        if let UnaryOp::Ref { mutable } = op {
            let name = match operand {
                Expr::Identifier(name) => name.clone(),
                _ => {
                    self.error("Borrow target must be an identifier");
                    return NodeType::Unknown;
                }
            };
            let (binding_type, binding_mutable) = match locals.lookup(&name) {
                Some(binding) => (binding.node_type.clone(), binding.mutable),
                None => {
                    self.error(format!("Unknown identifier: {}", name));
                    return NodeType::Unknown;
                }
            };
            if *mutable && !binding_mutable {
                self.error(format!(
                    "Cannot take mutable borrow of immutable variable: {}",
                    name
                ));
                return NodeType::Unknown;
            }
            if !self.validate_borrow_operation(self.borrows.validate_borrow(&name, *mutable)) {
                return NodeType::Unknown;
            }
            return NodeType::reference(binding_type, *mutable);
        }

        let operand_type = self.infer_expr(operand, locals);
        match op {
            UnaryOp::Deref => match operand_type {
                NodeType::Reference { inner, .. } => *inner,
                _ => {
                    self.error("Unary * requires reference operand");
                    NodeType::Unknown
                }
            },
            UnaryOp::Not => {
                if operand_type == NodeType::Bool {
                    NodeType::Bool
                } else {
                    self.error("Unary ! requires bool operand");
                    NodeType::Unknown
                }
            }
            UnaryOp::Neg => {
                if operand_type == NodeType::Int {
                    NodeType::Int
                } else {
                    self.error("Unary - requires int operand");
                    NodeType::Unknown
                }
            }
            UnaryOp::Ref { .. } => unreachable!("handled above"),
        }
    }

    fn infer_call(
        &mut self,
        callee: &[String],
        args: &[Expr],
        locals: &mut TypeEnvironment,
    ) -> NodeType {
        if is_print_call(callee) {
            if args.len() != 1 {
                self.error("print expects exactly one argument");
                return NodeType::Unknown;
            }
            let arg_type = self.infer_expr(&args[0], locals);
            if !arg_type.is_printable() {
                self.error(format!("print does not support type: {}", arg_type));
                return NodeType::Unknown;
            }
            return NodeType::Void;
        }

        if callee.len() == 2 {
            return self.infer_variant_call(&callee[0], &callee[1], args, locals);
        }

        if callee.len() != 1 {
            self.error("Only direct function calls are supported");
            return NodeType::Unknown;
        }

        let name = &callee[0];
        let sig = match self.functions.find(name).cloned() {
            Some(sig) => sig,
            None => {
                self.error(format!("Unknown function: {}", name));
                return NodeType::Unknown;
            }
        };

        if sig.param_types.len() != args.len() {
            self.error(format!(
                "Function '{}' expects {} arguments",
                name,
                sig.param_types.len()
            ));
            return NodeType::Unknown;
        }

        for (index, (arg, param_type)) in args.iter().zip(sig.param_types.iter()).enumerate() {
            let arg_type = self.infer_expr(arg, locals);
            if !is_assignable(param_type, &arg_type) {
                self.error(format!(
                    "Argument {} of '{}' expected {} got {}",
                    index + 1,
                    name,
                    param_type,
                    arg_type
                ));
                return NodeType::Unknown;
            }
            if !param_type.is_reference() && !self.consume_move_candidate(arg, &arg_type, locals) {
                return NodeType::Unknown;
            }
        }

        sig.return_type
    }

    fn infer_variant_call(
        &mut self,
        enum_name: &str,
        variant_name: &str,
        args: &[Expr],
        locals: &mut TypeEnvironment,
    ) -> NodeType {
        if enum_name == "Option" {
            if variant_name == "Some" {
                if args.len() != 1 {
                    self.error("Variant 'Some' expects one argument");
                    return NodeType::Unknown;
                }
                let arg_type = self.infer_expr(&args[0], locals);
                if arg_type == NodeType::Unknown || arg_type == NodeType::Void {
                    self.error("Variant 'Some' cannot take void");
                    return NodeType::Unknown;
                }
                if !self.consume_move_candidate(&args[0], &arg_type, locals) {
                    return NodeType::Unknown;
                }
                return NodeType::option(arg_type);
            }
            if variant_name == "None" {
                if !args.is_empty() {
                    self.error("Variant 'None' does not take a value");
                    return NodeType::Unknown;
                }
                return NodeType::option(NodeType::Infer);
            }
        }
        if enum_name == "Result" && (variant_name == "Ok" || variant_name == "Err") {
            if args.len() != 1 {
                self.error(format!("Variant '{}' expects one argument", variant_name));
                return NodeType::Unknown;
            }
            let arg_type = self.infer_expr(&args[0], locals);
            if arg_type == NodeType::Unknown || arg_type == NodeType::Void {
                self.error(format!("Variant '{}' cannot take void", variant_name));
                return NodeType::Unknown;
            }
            if !self.consume_move_candidate(&args[0], &arg_type, locals) {
                return NodeType::Unknown;
            }
            return if variant_name == "Ok" {
                NodeType::result(arg_type, NodeType::Infer)
            } else {
                NodeType::result(NodeType::Infer, arg_type)
            };
        }

        let def = match self.enums.find(enum_name).cloned() {
            Some(def) => def,
            None => {
                self.error(format!("Unknown enum: {}", enum_name));
                return NodeType::Unknown;
            }
        };
        let variant = match def.variant(variant_name) {
            Some(variant) => variant.clone(),
            None => {
                self.error(format!(
                    "Unknown variant '{}' on enum {}",
                    variant_name, enum_name
                ));
                return NodeType::Unknown;
            }
        };
        let payload = match &variant.payload {
            Some(payload) => payload.clone(),
            None => {
                self.error(format!(
                    "Variant '{}' does not take a value",
                    variant_name
                ));
                return NodeType::Unknown;
            }
        };
        if args.len() != 1 {
            self.error(format!("Variant '{}' expects one argument", variant_name));
            return NodeType::Unknown;
        }
        let arg_type = self.infer_expr(&args[0], locals);
        let payload_type = self.resolve_type_name(&payload);
        if payload_type == NodeType::Unknown {
            self.error(format!("Unknown payload type: {}", payload));
            return NodeType::Unknown;
        }
        if payload_type != NodeType::Any && payload_type != arg_type {
            self.error(format!(
                "Variant '{}' expects {} got {}",
                variant_name, payload_type, arg_type
            ));
            return NodeType::Unknown;
        }
        if payload_type == NodeType::Any && arg_type == NodeType::Void {
            self.error(format!("Variant '{}' cannot take void", variant_name));
            return NodeType::Unknown;
        }
        if !self.consume_move_candidate(&args[0], &arg_type, locals) {
            return NodeType::Unknown;
        }
        NodeType::Enum(enum_name.to_string())
    }

    fn infer_path(&mut self, segments: &[String]) -> NodeType {
        if segments.len() == 2 {
            let enum_name = &segments[0];
            let variant_name = &segments[1];
            if enum_name == "Option" && variant_name == "None" {
                return NodeType::option(NodeType::Infer);
            }
            if enum_name == "Result" && (variant_name == "Ok" || variant_name == "Err") {
                self.error(format!("Variant '{}' requires a value", variant_name));
                return NodeType::Unknown;
            }
            let def = match self.enums.find(enum_name).cloned() {
                Some(def) => def,
                None => {
                    self.error(format!("Unknown enum: {}", enum_name));
                    return NodeType::Unknown;
                }
            };
            let variant = match def.variant(variant_name) {
                Some(variant) => variant,
                None => {
                    self.error(format!(
                        "Unknown variant '{}' on enum {}",
                        variant_name, enum_name
                    ));
                    return NodeType::Unknown;
                }
            };
            if variant.payload.is_some() {
                self.error(format!("Variant '{}' requires a value", variant_name));
                return NodeType::Unknown;
            }
            return NodeType::Enum(enum_name.clone());
        }
        self.error(format!(
            "Unsupported path expression: {}",
            segments.join("::")
        ));
        NodeType::Unknown
    }

    fn infer_match(
        &mut self,
        target: &Expr,
        arms: &[crate::parsing::MatchArm],
        locals: &mut TypeEnvironment,
    ) -> NodeType {
        if arms.is_empty() {
            self.error("match requires at least one arm");
            return NodeType::Unknown;
        }
        let target_type = self.infer_expr(target, locals);
        if target_type == NodeType::Unknown {
            return NodeType::Unknown;
        }
        if !self.consume_move_candidate(target, &target_type, locals) {
            return NodeType::Unknown;
        }
        let enum_target =
            target_type.is_enum() || target_type.is_option() || target_type.is_result();
        if !matches!(
            target_type,
            NodeType::Int | NodeType::Bool | NodeType::Str
        ) && !enum_target
        {
            self.error("match target must be int, bool, String, or enum");
            return NodeType::Unknown;
        }

        let target_enum = if enum_target {
            // Option and Result resolve to their pre-registered definitions.
            let name = match &target_type {
                NodeType::Option(_) => Some(String::from("Option")),
                NodeType::Result { .. } => Some(String::from("Result")),
                _ => target_type.enum_name().map(str::to_string),
            };
            match name.and_then(|name| self.enums.find(&name).cloned()) {
                Some(def) => Some(def),
                None => {
                    self.error(format!(
                        "Unknown enum: {}",
                        target_type.enum_name().unwrap_or_default()
                    ));
                    return NodeType::Unknown;
                }
            }
        } else {
            None
        };
        let mut covered: HashSet<String> = HashSet::new();

        let mut has_wildcard = false;
        let mut arm_type: Option<NodeType> = None;
        let mut arm_locals_list = Vec::new();
        for (index, arm) in arms.iter().enumerate() {
            let has_guard = arm.guard.is_some();
            if matches!(arm.pattern, Pattern::Wildcard) && !has_guard {
                has_wildcard = true;
                if index != arms.len() - 1 {
                    self.error("wildcard '_' must be the last match arm");
                    return NodeType::Unknown;
                }
            } else {
                if !self.pattern_matches_type(&arm.pattern, &target_type) {
                    self.error("match pattern does not match target type");
                    return NodeType::Unknown;
                }
                if let Pattern::Range { start, end, .. } = &arm.pattern {
                    if start > end {
                        self.error("match range start must be <= end");
                        return NodeType::Unknown;
                    }
                }
                if let Pattern::Variant { variant, .. } = &arm.pattern {
                    if target_enum.is_some() && !has_guard {
                        covered.insert(variant.clone());
                    }
                }
            }
            let mut arm_locals = locals.fork();
            if matches!(arm.pattern, Pattern::Variant { .. })
                && !self.bind_enum_pattern(&arm.pattern, &target_type, &mut arm_locals)
            {
                return NodeType::Unknown;
            }
            if let Some(guard) = &arm.guard {
                let guard_type = self.infer_expr(guard, &mut arm_locals);
                if guard_type != NodeType::Bool {
                    self.error("match guard must be bool");
                    return NodeType::Unknown;
                }
            }
            let value_type = self.infer_expr(&arm.value, &mut arm_locals);
            arm_locals_list.push(arm_locals);
            if value_type == NodeType::Unknown {
                return NodeType::Unknown;
            }
            if value_type == NodeType::Void {
                self.error("match arm cannot be void");
                return NodeType::Unknown;
            }
            match &arm_type {
                None => arm_type = Some(value_type),
                Some(existing) => {
                    if *existing != value_type {
                        self.error("match arms must return the same type");
                        return NodeType::Unknown;
                    }
                }
            }
        }

        locals.join_moved_from_all(&arm_locals_list);

        if !has_wildcard {
            match &target_enum {
                Some(def) => {
                    let missing: Vec<String> = def
                        .variants
                        .iter()
                        .filter(|variant| !covered.contains(&variant.name))
                        .map(|variant| format!("{}::{}", def.name, variant.name))
                        .collect();
                    if !missing.is_empty() {
                        self.warn(format!(
                            "match expression is non-exhaustive (missing {})",
                            missing.join(", ")
                        ));
                    }
                }
                None => {
                    self.warn("match expression is non-exhaustive (missing '_')");
                }
            }
        }

        arm_type.unwrap_or(NodeType::Unknown)
    }

    // Patterns

    fn pattern_matches_type(&self, pattern: &Pattern, target_type: &NodeType) -> bool {
        if let Pattern::Variant {
            enum_name, variant, ..
        } = pattern
        {
            if target_type.is_option() {
                return enum_name == "Option" && (variant == "Some" || variant == "None");
            }
            if target_type.is_result() {
                return enum_name == "Result" && (variant == "Ok" || variant == "Err");
            }
        }
        match pattern {
            Pattern::Wildcard => true,
            Pattern::Int(_) | Pattern::Range { .. } => *target_type == NodeType::Int,
            Pattern::Bool(_) => *target_type == NodeType::Bool,
            Pattern::Str(_) => *target_type == NodeType::Str,
            Pattern::Variant {
                enum_name, variant, ..
            } => {
                let target_name = match target_type.enum_name() {
                    Some(name) => name,
                    None => return false,
                };
                if target_name != enum_name {
                    return false;
                }
                match self.enums.find(target_name) {
                    Some(def) => def.variant(variant).is_some(),
                    None => false,
                }
            }
        }
    }

    fn bind_enum_pattern(
        &mut self,
        pattern: &Pattern,
        target_type: &NodeType,
        locals: &mut TypeEnvironment,
    ) -> bool {
        let (enum_name, variant_name, binding) = match pattern {
            Pattern::Variant {
                enum_name,
                variant,
                binding,
            } => (enum_name, variant, binding),
            _ => return true,
        };
        if let NodeType::Option(inner) = target_type {
            if enum_name != "Option" {
                self.error("enum pattern does not match target enum");
                return false;
            }
            if variant_name == "None" {
                if binding.is_some() {
                    self.error("Variant 'None' does not bind a value");
                    return false;
                }
                return true;
            }
            if variant_name != "Some" {
                self.error(format!(
                    "Unknown variant '{}' on enum Option",
                    variant_name
                ));
                return false;
            }
            if let Some(binding) = binding {
                locals.define(binding, (**inner).clone(), false);
            }
            return true;
        }
        if let NodeType::Result { ok, err } = target_type {
            if enum_name != "Result" {
                self.error("enum pattern does not match target enum");
                return false;
            }
            match variant_name.as_str() {
                "Ok" => {
                    if let Some(binding) = binding {
                        locals.define(binding, (**ok).clone(), false);
                    }
                    true
                }
                "Err" => {
                    if let Some(binding) = binding {
                        locals.define(binding, (**err).clone(), false);
                    }
                    true
                }
                _ => {
                    self.error(format!(
                        "Unknown variant '{}' on enum Result",
                        variant_name
                    ));
                    false
                }
            }
        } else {
            let target_name = match target_type.enum_name() {
                Some(name) => name.to_string(),
                None => {
                    self.error("enum pattern used on non-enum type");
                    return false;
                }
            };
            if target_name != *enum_name {
                self.error("enum pattern does not match target enum");
                return false;
            }
            let def = match self.enums.find(&target_name).cloned() {
                Some(def) => def,
                None => {
                    self.error(format!("Unknown enum: {}", target_name));
                    return false;
                }
            };
            let variant = match def.variant(variant_name) {
                Some(variant) => variant.clone(),
                None => {
                    self.error(format!(
                        "Unknown variant '{}' on enum {}",
                        variant_name, def.name
                    ));
                    return false;
                }
            };
            let binding = match binding {
                Some(binding) => binding,
                None => return true,
            };
            let payload = match &variant.payload {
                Some(payload) => payload,
                None => {
                    self.error(format!(
                        "Variant '{}' does not bind a value",
                        variant.name
                    ));
                    return false;
                }
            };
            let payload_type = self.resolve_type_name(payload);
            if payload_type == NodeType::Unknown {
                self.error(format!("Unknown payload type: {}", payload));
                return false;
            }
            locals.define(binding, payload_type, false);
            true
        }
    }

    // Moves and borrows

    fn consume_move_candidate(
        &mut self,
        expr: &Expr,
        expr_type: &NodeType,
        locals: &mut TypeEnvironment,
    ) -> bool {
        if *expr_type == NodeType::Unknown || *expr_type == NodeType::Void || expr_type.is_copy() {
            return true;
        }
        let name = match expr {
            Expr::Identifier(name) => name.clone(),
            _ => return true,
        };
        let moved = match locals.lookup(&name) {
            Some(binding) => binding.moved,
            None => {
                self.error(format!("Unknown identifier: {}", name));
                return false;
            }
        };
        if moved {
            self.error(format!("Use of moved value: {}", name));
            return false;
        }
        if !self.validate_borrow_operation(self.borrows.validate_move(&name)) {
            return false;
        }
        locals.mark_moved(&name);
        true
    }

    /// `let r = &x;` keeps the loan on `x` alive for as long as `r` is in
    /// scope. Non-borrow initializers register nothing.
    fn register_persistent_borrow(
        &mut self,
        binding_name: &str,
        initializer: &Expr,
        locals: &TypeEnvironment,
    ) -> bool {
        let (mutable, operand) = match initializer {
            Expr::Unary {
                op: UnaryOp::Ref { mutable },
                expr,
            } => (*mutable, expr.as_ref()),
            _ => return true,
        };
        let target = match operand {
            Expr::Identifier(name) => name.clone(),
            _ => {
                self.error("Borrow target must be an identifier");
                return false;
            }
        };
        if locals.lookup(&target).is_none() {
            self.error(format!("Unknown identifier: {}", target));
            return false;
        }
        if !self.validate_borrow_operation(self.borrows.validate_borrow(&target, mutable)) {
            return false;
        }
        self.borrows.record_borrow(binding_name, &target, mutable);
        true
    }

    fn validate_borrow_operation(&mut self, check: BorrowCheck) -> bool {
        match check {
            Ok(()) => true,
            Err(message) => {
                self.error(message);
                false
            }
        }
    }

    // Type name resolution

    fn resolve_type_name(&self, type_name: &TypeName) -> NodeType {
        match type_name {
            TypeName::Reference { inner, mutable } => {
                let inner_type = self.resolve_type_name(inner);
                if inner_type == NodeType::Unknown || inner_type == NodeType::Void {
                    return NodeType::Unknown;
                }
                NodeType::reference(inner_type, *mutable)
            }
            TypeName::Generic { base, args } => match (base.as_str(), args.len()) {
                ("Option", 1) => {
                    let inner = self.resolve_type_name(&args[0]);
                    if inner == NodeType::Unknown {
                        return NodeType::Unknown;
                    }
                    NodeType::option(inner)
                }
                ("Result", 2) => {
                    let ok = self.resolve_type_name(&args[0]);
                    let err = self.resolve_type_name(&args[1]);
                    if ok == NodeType::Unknown || err == NodeType::Unknown {
                        return NodeType::Unknown;
                    }
                    NodeType::result(ok, err)
                }
                _ => NodeType::Unknown,
            },
            TypeName::Named(name) => match name.as_str() {
                "String" | "std::String" => NodeType::Str,
                "i32" | "int" => NodeType::Int,
                "bool" => NodeType::Bool,
                "Any" | "std::Any" => NodeType::Any,
                "void" => NodeType::Void,
                _ => {
                    if self.structs.find(name).is_some() {
                        NodeType::Struct(name.clone())
                    } else if self.enums.find(name).is_some() {
                        NodeType::Enum(name.clone())
                    } else {
                        NodeType::Unknown
                    }
                }
            },
        }
    }

    fn resolve_return_type(&mut self, type_name: Option<&TypeName>) -> NodeType {
        let type_name = match type_name {
            Some(type_name) => type_name,
            None => return NodeType::Void,
        };
        let resolved = self.resolve_type_name(type_name);
        if resolved == NodeType::Unknown {
            self.error(format!("Unknown type: {}", type_name));
        }
        resolved
    }

    fn error<M: Into<String>>(&mut self, message: M) {
        self.diagnostics.error(message, &self.current_path);
    }

    fn warn<M: Into<String>>(&mut self, message: M) {
        let message = format!("warning: {}", message.into());
        self.diagnostics
            .report(Diagnostic::new(message, &self.current_path));
    }
}

fn is_print_call(callee: &[String]) -> bool {
    match callee {
        [single] => single == "print",
        [first, second] => first == "std" && second == "print",
        _ => false,
    }
}

/// Conservative return-path analysis: a block definitely returns a value if
/// it hits a `return <expr>` or an if/else where both branches do.
fn always_returns(statements: &[Stmt]) -> bool {
    for stmt in statements {
        match stmt {
            Stmt::Return(value) => return value.is_some(),
            Stmt::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                if always_returns(then_branch) && always_returns(else_branch) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}
