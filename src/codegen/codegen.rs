use super::builtins::{builtin_unions, emit_tagged_union};
use super::instruction::{Instruction, Label};
use super::module::{BinaryModule, FunctionCode, ModuleBuilder};
use crate::parsing::{
    AssignOp, BinaryOp, EnumDecl, Expr, FunctionDecl, Item, ItemKind, MatchArm, Pattern, Stmt,
    StructDecl, TypeName, UnaryOp,
};
use crate::type_checker::NodeType;
use log::trace;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug)]
pub enum CodegenError {
    MissingMain,
    MainSignature,
    Unsupported(String),
    Internal(String),
}

impl CodegenError {
    pub(super) fn internal<M: Into<String>>(message: M) -> Self {
        CodegenError::Internal(message.into())
    }

    fn unsupported<M: Into<String>>(message: M) -> Self {
        CodegenError::Unsupported(message.into())
    }
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodegenError::MissingMain => write!(f, "no main function defined"),
            CodegenError::MainSignature => write!(f, "main does not accept parameters"),
            CodegenError::Unsupported(message) => write!(f, "unsupported construct: {}", message),
            CodegenError::Internal(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CodegenError {}

/// The value category an expression leaves on the operand stack, used to
/// pick the instruction family (typed loads/stores, typed print).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Bool,
    Str,
    Ref,
    Void,
}

pub fn value_kind(node_type: &NodeType) -> ValueKind {
    match node_type {
        NodeType::Int => ValueKind::Int,
        NodeType::Bool => ValueKind::Bool,
        NodeType::Str => ValueKind::Str,
        NodeType::Void => ValueKind::Void,
        NodeType::Reference { inner, .. } => value_kind(inner),
        _ => ValueKind::Ref,
    }
}

fn is_int_family(kind: ValueKind) -> bool {
    matches!(kind, ValueKind::Int | ValueKind::Bool)
}

#[derive(Clone, Debug)]
struct FnSig {
    param_types: Vec<NodeType>,
    return_type: NodeType,
}

#[derive(Debug)]
pub struct CodegenOutput {
    pub entry: String,
    pub modules: Vec<BinaryModule>,
}

/// Lowers a checked program into binary modules: one entry module holding
/// every user function, plus one tagged-union module per enum (built-in and
/// user-defined alike). Types are re-derived locally during emission; the
/// checker has already validated the program, so any inconsistency found
/// here is an internal error rather than a user diagnostic.
pub struct Codegen {
    module_name: String,
    structs: HashMap<String, StructDecl>,
    enums: HashMap<String, EnumDecl>,
    functions: HashMap<String, FnSig>,
}

impl Codegen {
    pub fn emit(items: &[Item], module_name: &str) -> Result<CodegenOutput, CodegenError> {
        let mut codegen = Codegen {
            module_name: module_name.to_string(),
            structs: HashMap::new(),
            enums: HashMap::new(),
            functions: HashMap::new(),
        };
        for union in builtin_unions() {
            codegen.enums.insert(union.name.clone(), union);
        }
        for item in items {
            match &item.kind {
                ItemKind::Struct(decl) => {
                    codegen.structs.insert(decl.name.clone(), decl.clone());
                }
                ItemKind::Enum(decl) => {
                    codegen.enums.insert(decl.name.clone(), decl.clone());
                }
                _ => {}
            }
        }
        for item in items {
            if let ItemKind::Function(decl) = &item.kind {
                let sig = FnSig {
                    param_types: decl
                        .params
                        .iter()
                        .map(|param| codegen.resolve_type(&param.type_name))
                        .collect(),
                    return_type: decl
                        .return_type
                        .as_ref()
                        .map(|name| codegen.resolve_type(name))
                        .unwrap_or(NodeType::Void),
                };
                codegen.functions.insert(decl.name.clone(), sig);
            }
        }

        match codegen.functions.get("main") {
            None => return Err(CodegenError::MissingMain),
            Some(sig) if !sig.param_types.is_empty() => return Err(CodegenError::MainSignature),
            Some(_) => {}
        }

        let mut builder = ModuleBuilder::new(module_name);
        for item in items {
            if let ItemKind::Function(decl) = &item.kind {
                trace!(target: "codegen", "Emitting function {}", decl.name);
                builder.add_function(codegen.emit_function(decl)?);
            }
        }
        let mut modules = vec![builder.finish()?];
        let mut union_names: Vec<&String> = codegen.enums.keys().collect();
        union_names.sort();
        for name in union_names {
            modules.push(emit_tagged_union(&codegen.enums[name])?);
        }

        Ok(CodegenOutput {
            entry: module_name.to_string(),
            modules,
        })
    }

    fn emit_function(&self, decl: &FunctionDecl) -> Result<FunctionCode, CodegenError> {
        let mut state = FnState::new(self, &decl.name, decl.params.len() as u8);
        state.push_scope();
        for param in &decl.params {
            let param_type = self.resolve_type(&param.type_name);
            state.define_local(&param.name, param_type);
        }
        state.emit_stmts(&decl.body)?;
        // Implicit fall-off return for void functions without a trailing
        // `return;`.
        if decl.return_type.is_none() {
            state.code.emit(Instruction::Return);
        }
        state.pop_scope();
        Ok(state.into_code())
    }

    fn resolve_type(&self, type_name: &TypeName) -> NodeType {
        match type_name {
            TypeName::Reference { inner, mutable } => {
                NodeType::reference(self.resolve_type(inner), *mutable)
            }
            TypeName::Generic { base, args } => match (base.as_str(), args.len()) {
                ("Option", 1) => NodeType::option(self.resolve_type(&args[0])),
                ("Result", 2) => NodeType::result(
                    self.resolve_type(&args[0]),
                    self.resolve_type(&args[1]),
                ),
                _ => NodeType::Unknown,
            },
            TypeName::Named(name) => match name.as_str() {
                "String" | "std::String" => NodeType::Str,
                "i32" | "int" => NodeType::Int,
                "bool" => NodeType::Bool,
                "Any" | "std::Any" => NodeType::Any,
                "void" => NodeType::Void,
                _ => {
                    if self.structs.contains_key(name) {
                        NodeType::Struct(name.clone())
                    } else if self.enums.contains_key(name) {
                        NodeType::Enum(name.clone())
                    } else {
                        NodeType::Unknown
                    }
                }
            },
        }
    }
}

struct LoopFrame {
    label: Option<String>,
    continue_label: Label,
    break_label: Label,
    allows_value: bool,
    result: Option<(u16, NodeType)>,
}

/// Per-function emission state: the code buffer, a lexical scope stack of
/// named local slots, and the active loop frames for break/continue.
struct FnState<'a> {
    gen: &'a Codegen,
    code: FunctionCode,
    scopes: Vec<HashMap<String, (u16, NodeType)>>,
    next_slot: u16,
    loops: Vec<LoopFrame>,
}

impl<'a> FnState<'a> {
    fn new(gen: &'a Codegen, name: &str, argc: u8) -> Self {
        FnState {
            gen,
            code: FunctionCode::new(name, argc),
            scopes: Vec::new(),
            next_slot: 0,
            loops: Vec::new(),
        }
    }

    fn into_code(self) -> FunctionCode {
        self.code
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Slot indices grow monotonically; no reuse across scopes.
    fn define_local(&mut self, name: &str, node_type: NodeType) -> u16 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.code.max_slots = self.code.max_slots.max(self.next_slot);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), (slot, node_type));
        }
        slot
    }

    fn temp_slot(&mut self) -> u16 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.code.max_slots = self.code.max_slots.max(self.next_slot);
        slot
    }

    fn lookup(&self, name: &str) -> Result<(u16, NodeType), CodegenError> {
        for scope in self.scopes.iter().rev() {
            if let Some((slot, node_type)) = scope.get(name) {
                return Ok((*slot, node_type.clone()));
            }
        }
        Err(CodegenError::internal(format!(
            "unknown local '{}' reached codegen",
            name
        )))
    }

    fn store(&mut self, slot: u16, kind: ValueKind) {
        if is_int_family(kind) {
            self.code.emit(Instruction::StoreInt(slot));
        } else {
            self.code.emit(Instruction::StoreRef(slot));
        }
    }

    fn load(&mut self, slot: u16, kind: ValueKind) {
        if is_int_family(kind) {
            self.code.emit(Instruction::LoadInt(slot));
        } else {
            self.code.emit(Instruction::LoadRef(slot));
        }
    }

    // Statements

    fn emit_stmts(&mut self, statements: &[Stmt]) -> Result<(), CodegenError> {
        self.push_scope();
        for stmt in statements {
            self.emit_stmt(stmt)?;
        }
        self.pop_scope();
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Let {
                name,
                type_name,
                value,
                ..
            } => {
                let value_type = self.emit_expr(value)?;
                let final_type = match type_name {
                    Some(type_name) => self.gen.resolve_type(type_name),
                    None => value_type,
                };
                let kind = value_kind(&final_type);
                let slot = self.define_local(name, final_type);
                self.store(slot, kind);
                Ok(())
            }
            Stmt::Assign { name, op, value } => {
                let (slot, node_type) = self.lookup(name)?;
                let kind = value_kind(&node_type);
                if let Some(arith) = compound_op(*op) {
                    self.load(slot, kind);
                    self.emit_expr(value)?;
                    self.code.emit(arith);
                } else {
                    self.emit_expr(value)?;
                }
                self.store(slot, kind);
                Ok(())
            }
            Stmt::Expression(expr) => {
                let node_type = self.emit_expr(expr)?;
                if value_kind(&node_type) != ValueKind::Void {
                    self.code.emit(Instruction::Pop);
                }
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let else_label = self.code.new_label();
                let end_label = self.code.new_label();
                self.emit_expr(condition)?;
                self.code.emit(Instruction::JumpIfFalse(else_label));
                self.emit_stmts(then_branch)?;
                self.code.emit(Instruction::Jump(end_label));
                self.code.mark(else_label);
                if let Some(else_branch) = else_branch {
                    self.emit_stmts(else_branch)?;
                }
                self.code.mark(end_label);
                Ok(())
            }
            Stmt::IfLet {
                pattern,
                target,
                then_branch,
                else_branch,
            } => {
                let else_label = self.code.new_label();
                let end_label = self.code.new_label();
                let target_type = self.emit_expr(target)?;
                let temp = self.temp_slot();
                let target_kind = value_kind(&target_type);
                self.store(temp, target_kind);

                self.push_scope();
                self.emit_pattern_test(pattern, temp, &target_type, else_label)?;
                self.emit_pattern_bindings(pattern, temp, &target_type)?;
                self.emit_stmts(then_branch)?;
                self.pop_scope();
                self.code.emit(Instruction::Jump(end_label));
                self.code.mark(else_label);
                if let Some(else_branch) = else_branch {
                    self.emit_stmts(else_branch)?;
                }
                self.code.mark(end_label);
                Ok(())
            }
            Stmt::While {
                label,
                condition,
                body,
            } => {
                let start_label = self.code.new_label();
                let end_label = self.code.new_label();
                self.code.mark(start_label);
                self.emit_expr(condition)?;
                self.code.emit(Instruction::JumpIfFalse(end_label));
                self.loops.push(LoopFrame {
                    label: label.clone(),
                    continue_label: start_label,
                    break_label: end_label,
                    allows_value: false,
                    result: None,
                });
                self.emit_stmts(body)?;
                self.loops.pop();
                self.code.emit(Instruction::Jump(start_label));
                self.code.mark(end_label);
                Ok(())
            }
            Stmt::WhileLet {
                label,
                pattern,
                target,
                body,
            } => {
                let start_label = self.code.new_label();
                let end_label = self.code.new_label();
                self.code.mark(start_label);
                let target_type = self.emit_expr(target)?;
                let temp = self.temp_slot();
                let target_kind = value_kind(&target_type);
                self.store(temp, target_kind);

                self.push_scope();
                self.emit_pattern_test(pattern, temp, &target_type, end_label)?;
                self.emit_pattern_bindings(pattern, temp, &target_type)?;
                self.loops.push(LoopFrame {
                    label: label.clone(),
                    continue_label: start_label,
                    break_label: end_label,
                    allows_value: false,
                    result: None,
                });
                self.emit_stmts(body)?;
                self.loops.pop();
                self.pop_scope();
                self.code.emit(Instruction::Jump(start_label));
                self.code.mark(end_label);
                Ok(())
            }
            Stmt::For {
                label,
                binding,
                start,
                end,
                inclusive,
                body,
            } => {
                self.push_scope();
                self.emit_expr(start)?;
                let var_slot = self.define_local(binding, NodeType::Int);
                self.code.emit(Instruction::StoreInt(var_slot));
                self.emit_expr(end)?;
                let end_slot = self.temp_slot();
                self.code.emit(Instruction::StoreInt(end_slot));

                let test_label = self.code.new_label();
                let continue_label = self.code.new_label();
                let break_label = self.code.new_label();
                self.code.mark(test_label);
                self.code.emit(Instruction::LoadInt(var_slot));
                self.code.emit(Instruction::LoadInt(end_slot));
                self.code.emit(if *inclusive {
                    Instruction::IntLe
                } else {
                    Instruction::IntLt
                });
                self.code.emit(Instruction::JumpIfFalse(break_label));
                self.loops.push(LoopFrame {
                    label: label.clone(),
                    continue_label,
                    break_label,
                    allows_value: false,
                    result: None,
                });
                self.emit_stmts(body)?;
                self.loops.pop();
                self.code.mark(continue_label);
                self.code.emit(Instruction::LoadInt(var_slot));
                self.code.emit(Instruction::PushInt(1));
                self.code.emit(Instruction::Add);
                self.code.emit(Instruction::StoreInt(var_slot));
                self.code.emit(Instruction::Jump(test_label));
                self.code.mark(break_label);
                self.pop_scope();
                Ok(())
            }
            Stmt::Loop { label, body } => {
                let start_label = self.code.new_label();
                let end_label = self.code.new_label();
                self.code.mark(start_label);
                self.loops.push(LoopFrame {
                    label: label.clone(),
                    continue_label: start_label,
                    break_label: end_label,
                    allows_value: false,
                    result: None,
                });
                self.emit_stmts(body)?;
                self.loops.pop();
                self.code.emit(Instruction::Jump(start_label));
                self.code.mark(end_label);
                Ok(())
            }
            Stmt::Break { label, value } => {
                let frame_index = self.resolve_loop(label.as_deref())?;
                if let Some(value) = value {
                    if !self.loops[frame_index].allows_value {
                        return Err(CodegenError::internal(
                            "break with value outside loop expression",
                        ));
                    }
                    let value_type = self.emit_expr(value)?;
                    let kind = value_kind(&value_type);
                    let existing = self.loops[frame_index]
                        .result
                        .as_ref()
                        .map(|(slot, _)| *slot);
                    let slot = match existing {
                        Some(slot) => slot,
                        None => {
                            let slot = self.temp_slot();
                            self.loops[frame_index].result = Some((slot, value_type));
                            slot
                        }
                    };
                    self.store(slot, kind);
                }
                let break_label = self.loops[frame_index].break_label;
                self.code.emit(Instruction::Jump(break_label));
                Ok(())
            }
            Stmt::Continue { label } => {
                let frame_index = self.resolve_loop(label.as_deref())?;
                let continue_label = self.loops[frame_index].continue_label;
                self.code.emit(Instruction::Jump(continue_label));
                Ok(())
            }
            Stmt::Return(value) => {
                match value {
                    Some(value) => {
                        self.emit_expr(value)?;
                        self.code.emit(Instruction::ReturnValue);
                    }
                    None => self.code.emit(Instruction::Return),
                }
                Ok(())
            }
        }
    }

    fn resolve_loop(&self, label: Option<&str>) -> Result<usize, CodegenError> {
        match label {
            None => {
                if self.loops.is_empty() {
                    return Err(CodegenError::internal("break/continue outside loop"));
                }
                Ok(self.loops.len() - 1)
            }
            Some(label) => self
                .loops
                .iter()
                .rposition(|frame| frame.label.as_deref() == Some(label))
                .ok_or_else(|| {
                    CodegenError::internal(format!("unknown loop label '{}'", label))
                }),
        }
    }

    // Expressions. Each emitter leaves exactly one value on the stack
    // (except `Void` results) and returns the value's type.

    fn emit_expr(&mut self, expr: &Expr) -> Result<NodeType, CodegenError> {
        match expr {
            Expr::Number(value) => {
                self.code.emit(Instruction::PushInt(*value));
                Ok(NodeType::Int)
            }
            Expr::Bool(value) => {
                self.code.emit(Instruction::PushBool(*value));
                Ok(NodeType::Bool)
            }
            Expr::Str(value) => {
                self.code.emit(Instruction::PushStr(value.clone()));
                Ok(NodeType::Str)
            }
            Expr::Identifier(name) => {
                let (slot, node_type) = self.lookup(name)?;
                self.load(slot, value_kind(&node_type));
                Ok(node_type)
            }
            Expr::Path(segments) => self.emit_path(segments),
            Expr::Binary { left, op, right } => self.emit_binary(left, *op, right),
            Expr::Unary { op, expr } => match op {
                UnaryOp::Neg => {
                    self.emit_expr(expr)?;
                    self.code.emit(Instruction::Neg);
                    Ok(NodeType::Int)
                }
                UnaryOp::Not => {
                    self.emit_expr(expr)?;
                    self.code.emit(Instruction::Not);
                    Ok(NodeType::Bool)
                }
                // References are erased at runtime: a borrow loads the
                // target's current value, a deref is the identity.
                UnaryOp::Ref { mutable } => {
                    let inner = self.emit_expr(expr)?;
                    Ok(NodeType::reference(inner, *mutable))
                }
                UnaryOp::Deref => {
                    let operand_type = self.emit_expr(expr)?;
                    match operand_type {
                        NodeType::Reference { inner, .. } => Ok(*inner),
                        other => Ok(other),
                    }
                }
            },
            Expr::FieldAccess { target, field } => {
                let target_type = self.emit_expr(target)?;
                let struct_name = match target_type.struct_name() {
                    Some(name) => name.to_string(),
                    None => {
                        return Err(CodegenError::internal(format!(
                            "field access on non-struct type {}",
                            target_type
                        )))
                    }
                };
                let decl = self.gen.structs.get(&struct_name).ok_or_else(|| {
                    CodegenError::internal(format!("unknown struct {}", struct_name))
                })?;
                let field_decl = decl.field(field).ok_or_else(|| {
                    CodegenError::internal(format!(
                        "unknown field '{}' on struct {}",
                        field, struct_name
                    ))
                })?;
                let field_type = self.gen.resolve_type(&field_decl.type_name);
                self.code.emit(Instruction::GetField(field.clone()));
                self.emit_unbox(&field_type);
                Ok(field_type)
            }
            Expr::Call { callee, args } => self.emit_call(callee, args),
            Expr::StructInit { name, fields } => {
                let decl = self
                    .gen
                    .structs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| CodegenError::internal(format!("unknown struct {}", name)))?;
                let mut field_names = Vec::new();
                for field_decl in &decl.fields {
                    let init = fields
                        .iter()
                        .find(|field| field.name == field_decl.name)
                        .ok_or_else(|| {
                            CodegenError::internal(format!(
                                "missing field '{}' for struct {}",
                                field_decl.name, name
                            ))
                        })?;
                    let field_type = self.emit_expr(&init.value)?;
                    self.emit_box(&field_type);
                    field_names.push(field_decl.name.clone());
                }
                self.code.emit(Instruction::NewStruct {
                    type_name: name.clone(),
                    fields: field_names,
                });
                Ok(NodeType::Struct(name.clone()))
            }
            Expr::Block { statements, value } => {
                self.push_scope();
                for stmt in statements {
                    self.emit_stmt(stmt)?;
                }
                let value_type = self.emit_expr(value)?;
                self.pop_scope();
                Ok(value_type)
            }
            Expr::If {
                condition,
                then_expr,
                else_expr,
            } => {
                let else_label = self.code.new_label();
                let end_label = self.code.new_label();
                self.emit_expr(condition)?;
                self.code.emit(Instruction::JumpIfFalse(else_label));
                let then_type = self.emit_expr(then_expr)?;
                self.code.emit(Instruction::Jump(end_label));
                self.code.mark(else_label);
                self.emit_expr(else_expr)?;
                self.code.mark(end_label);
                Ok(then_type)
            }
            Expr::Loop { body } => {
                let start_label = self.code.new_label();
                let end_label = self.code.new_label();
                self.code.mark(start_label);
                self.loops.push(LoopFrame {
                    label: None,
                    continue_label: start_label,
                    break_label: end_label,
                    allows_value: true,
                    result: None,
                });
                self.emit_stmts(body)?;
                let frame = self.loops.pop();
                self.code.emit(Instruction::Jump(start_label));
                self.code.mark(end_label);
                match frame.and_then(|frame| frame.result) {
                    Some((slot, node_type)) => {
                        self.load(slot, value_kind(&node_type));
                        Ok(node_type)
                    }
                    None => Err(CodegenError::internal(
                        "loop expression without break value",
                    )),
                }
            }
            Expr::Match { target, arms } => self.emit_match(target, arms),
        }
    }

    fn emit_path(&mut self, segments: &[String]) -> Result<NodeType, CodegenError> {
        if segments.len() != 2 {
            return Err(CodegenError::unsupported(format!(
                "path expression {}",
                segments.join("::")
            )));
        }
        let enum_name = &segments[0];
        let variant_name = &segments[1];
        self.code.emit(Instruction::Call {
            owner: enum_name.clone(),
            name: variant_name.clone(),
            argc: 0,
        });
        if enum_name == "Option" {
            return Ok(NodeType::option(NodeType::Infer));
        }
        Ok(NodeType::Enum(enum_name.clone()))
    }

    fn emit_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
    ) -> Result<NodeType, CodegenError> {
        if op == BinaryOp::And {
            let short_label = self.code.new_label();
            let end_label = self.code.new_label();
            self.emit_expr(left)?;
            self.code.emit(Instruction::JumpIfFalse(short_label));
            self.emit_expr(right)?;
            self.code.emit(Instruction::Jump(end_label));
            self.code.mark(short_label);
            self.code.emit(Instruction::PushBool(false));
            self.code.mark(end_label);
            return Ok(NodeType::Bool);
        }
        if op == BinaryOp::Or {
            let short_label = self.code.new_label();
            let end_label = self.code.new_label();
            self.emit_expr(left)?;
            self.code.emit(Instruction::JumpIfTrue(short_label));
            self.emit_expr(right)?;
            self.code.emit(Instruction::Jump(end_label));
            self.code.mark(short_label);
            self.code.emit(Instruction::PushBool(true));
            self.code.mark(end_label);
            return Ok(NodeType::Bool);
        }

        let left_type = self.emit_expr(left)?;
        self.emit_expr(right)?;
        let instruction = match op {
            BinaryOp::Add => Instruction::Add,
            BinaryOp::Sub => Instruction::Sub,
            BinaryOp::Mul => Instruction::Mul,
            BinaryOp::Div => Instruction::Div,
            BinaryOp::Lt => Instruction::IntLt,
            BinaryOp::Le => Instruction::IntLe,
            BinaryOp::Gt => Instruction::IntGt,
            BinaryOp::Ge => Instruction::IntGe,
            BinaryOp::Eq => {
                if is_int_family(value_kind(&left_type)) {
                    Instruction::IntEq
                } else {
                    Instruction::ValueEq
                }
            }
            BinaryOp::Ne => {
                if is_int_family(value_kind(&left_type)) {
                    Instruction::IntNe
                } else {
                    Instruction::ValueNe
                }
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        };
        self.code.emit(instruction);
        Ok(match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => NodeType::Int,
            _ => NodeType::Bool,
        })
    }

    fn emit_call(&mut self, callee: &[String], args: &[Expr]) -> Result<NodeType, CodegenError> {
        if is_print_call(callee) {
            let arg = args
                .first()
                .ok_or_else(|| CodegenError::internal("print call without argument"))?;
            let arg_type = self.emit_expr(arg)?;
            let print = match value_kind(&arg_type) {
                ValueKind::Int => Instruction::PrintInt,
                ValueKind::Bool => Instruction::PrintBool,
                ValueKind::Str => Instruction::PrintStr,
                ValueKind::Ref => Instruction::PrintRef,
                ValueKind::Void => {
                    return Err(CodegenError::internal("print of void value"))
                }
            };
            self.code.emit(print);
            return Ok(NodeType::Void);
        }

        if callee.len() == 2 {
            return self.emit_variant_call(&callee[0], &callee[1], args);
        }
        if callee.len() != 1 {
            return Err(CodegenError::unsupported(format!(
                "call to {}",
                callee.join("::")
            )));
        }

        let name = &callee[0];
        let sig = self
            .gen
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| CodegenError::internal(format!("unknown function {}", name)))?;
        for arg in args {
            self.emit_expr(arg)?;
        }
        self.code.emit(Instruction::Call {
            owner: self.gen.module_name.clone(),
            name: name.clone(),
            argc: args.len() as u8,
        });
        Ok(sig.return_type)
    }

    fn emit_variant_call(
        &mut self,
        enum_name: &str,
        variant_name: &str,
        args: &[Expr],
    ) -> Result<NodeType, CodegenError> {
        let arg_type = match args.first() {
            Some(arg) => {
                let arg_type = self.emit_expr(arg)?;
                // Union payloads are always boxed.
                self.emit_box(&arg_type);
                Some(arg_type)
            }
            None => None,
        };
        self.code.emit(Instruction::Call {
            owner: enum_name.to_string(),
            name: variant_name.to_string(),
            argc: args.len() as u8,
        });
        match (enum_name, variant_name) {
            ("Option", "Some") => Ok(NodeType::option(arg_type.unwrap_or(NodeType::Infer))),
            ("Option", "None") => Ok(NodeType::option(NodeType::Infer)),
            ("Result", "Ok") => Ok(NodeType::result(
                arg_type.unwrap_or(NodeType::Infer),
                NodeType::Infer,
            )),
            ("Result", "Err") => Ok(NodeType::result(
                NodeType::Infer,
                arg_type.unwrap_or(NodeType::Infer),
            )),
            _ => Ok(NodeType::Enum(enum_name.to_string())),
        }
    }

    fn emit_match(&mut self, target: &Expr, arms: &[MatchArm]) -> Result<NodeType, CodegenError> {
        let target_type = self.emit_expr(target)?;
        let temp = self.temp_slot();
        self.store(temp, value_kind(&target_type));

        let end_label = self.code.new_label();
        let mut result_type: Option<NodeType> = None;
        for arm in arms {
            let next_label = self.code.new_label();
            self.push_scope();
            self.emit_pattern_test(&arm.pattern, temp, &target_type, next_label)?;
            self.emit_pattern_bindings(&arm.pattern, temp, &target_type)?;
            if let Some(guard) = &arm.guard {
                self.emit_expr(guard)?;
                self.code.emit(Instruction::JumpIfFalse(next_label));
            }
            let arm_type = self.emit_expr(&arm.value)?;
            self.pop_scope();
            if result_type.is_none() {
                result_type = Some(arm_type);
            }
            self.code.emit(Instruction::Jump(end_label));
            self.code.mark(next_label);
        }
        // A wildcard or exhaustive enum match never reaches this; anything
        // else was warned about by the checker.
        self.code.emit(Instruction::Trap(String::from(
            "match fell through every arm",
        )));
        self.code.mark(end_label);
        result_type.ok_or_else(|| CodegenError::internal("match with no arms"))
    }

    /// Emits the comparison sequence for one pattern; falls through when the
    /// pattern matches, jumps to `fail_label` when it does not.
    fn emit_pattern_test(
        &mut self,
        pattern: &Pattern,
        temp: u16,
        target_type: &NodeType,
        fail_label: Label,
    ) -> Result<(), CodegenError> {
        let target_kind = value_kind(target_type);
        match pattern {
            Pattern::Wildcard => Ok(()),
            Pattern::Int(value) => {
                self.load(temp, target_kind);
                self.code.emit(Instruction::PushInt(*value));
                self.code.emit(Instruction::IntEq);
                self.code.emit(Instruction::JumpIfFalse(fail_label));
                Ok(())
            }
            Pattern::Bool(value) => {
                self.load(temp, target_kind);
                self.code.emit(Instruction::PushBool(*value));
                self.code.emit(Instruction::IntEq);
                self.code.emit(Instruction::JumpIfFalse(fail_label));
                Ok(())
            }
            Pattern::Str(value) => {
                self.load(temp, target_kind);
                self.code.emit(Instruction::PushStr(value.clone()));
                self.code.emit(Instruction::ValueEq);
                self.code.emit(Instruction::JumpIfFalse(fail_label));
                Ok(())
            }
            Pattern::Range {
                start,
                end,
                inclusive,
            } => {
                self.load(temp, target_kind);
                self.code.emit(Instruction::PushInt(*start));
                self.code.emit(Instruction::IntGe);
                self.code.emit(Instruction::JumpIfFalse(fail_label));
                self.load(temp, target_kind);
                self.code.emit(Instruction::PushInt(*end));
                self.code.emit(if *inclusive {
                    Instruction::IntLe
                } else {
                    Instruction::IntLt
                });
                self.code.emit(Instruction::JumpIfFalse(fail_label));
                Ok(())
            }
            Pattern::Variant { variant, .. } => {
                let tag = self.variant_tag(target_type, variant)?;
                self.load(temp, target_kind);
                self.code.emit(Instruction::GetTag);
                self.code.emit(Instruction::PushInt(tag as i32));
                self.code.emit(Instruction::IntEq);
                self.code.emit(Instruction::JumpIfFalse(fail_label));
                Ok(())
            }
        }
    }

    /// Extracts and stores a variant pattern's payload binding, if any. Must
    /// run after the tag test has passed.
    fn emit_pattern_bindings(
        &mut self,
        pattern: &Pattern,
        temp: u16,
        target_type: &NodeType,
    ) -> Result<(), CodegenError> {
        let (variant, binding) = match pattern {
            Pattern::Variant {
                variant,
                binding: Some(binding),
                ..
            } => (variant, binding),
            _ => return Ok(()),
        };
        let tag = self.variant_tag(target_type, variant)?;
        let payload_type = self.payload_type(target_type, variant)?;
        self.load(temp, value_kind(target_type));
        self.code.emit(Instruction::GetPayload(tag as u8));
        self.emit_unbox(&payload_type);
        let kind = value_kind(&payload_type);
        let slot = self.define_local(binding, payload_type);
        self.store(slot, kind);
        Ok(())
    }

    fn variant_tag(&self, target_type: &NodeType, variant: &str) -> Result<usize, CodegenError> {
        let enum_name = match target_type {
            NodeType::Option(_) => "Option",
            NodeType::Result { .. } => "Result",
            NodeType::Enum(name) => name.as_str(),
            other => {
                return Err(CodegenError::internal(format!(
                    "variant pattern on non-union type {}",
                    other
                )))
            }
        };
        let decl = self
            .gen
            .enums
            .get(enum_name)
            .ok_or_else(|| CodegenError::internal(format!("unknown enum {}", enum_name)))?;
        decl.variant_tag(variant).ok_or_else(|| {
            CodegenError::internal(format!(
                "unknown variant '{}' on enum {}",
                variant, enum_name
            ))
        })
    }

    fn payload_type(
        &self,
        target_type: &NodeType,
        variant: &str,
    ) -> Result<NodeType, CodegenError> {
        match target_type {
            NodeType::Option(inner) => Ok((**inner).clone()),
            NodeType::Result { ok, err } => {
                if variant == "Ok" {
                    Ok((**ok).clone())
                } else {
                    Ok((**err).clone())
                }
            }
            NodeType::Enum(name) => {
                let decl = self
                    .gen
                    .enums
                    .get(name)
                    .ok_or_else(|| CodegenError::internal(format!("unknown enum {}", name)))?;
                let declared = decl
                    .variant(variant)
                    .and_then(|variant| variant.payload.as_ref())
                    .ok_or_else(|| {
                        CodegenError::internal(format!(
                            "variant '{}' of {} has no payload",
                            variant, name
                        ))
                    })?;
                Ok(self.gen.resolve_type(declared))
            }
            other => Err(CodegenError::internal(format!(
                "variant pattern on non-union type {}",
                other
            ))),
        }
    }

    /// Boxes an int-family value so it can live in an `Any` position
    /// (union payloads, struct fields). Reference-category values pass
    /// through untouched.
    fn emit_box(&mut self, node_type: &NodeType) {
        match value_kind(node_type) {
            ValueKind::Int => self.code.emit(Instruction::BoxInt),
            ValueKind::Bool => self.code.emit(Instruction::BoxBool),
            _ => {}
        }
    }

    fn emit_unbox(&mut self, node_type: &NodeType) {
        match value_kind(node_type) {
            ValueKind::Int => self.code.emit(Instruction::UnboxInt),
            ValueKind::Bool => self.code.emit(Instruction::UnboxBool),
            _ => {}
        }
    }
}

fn compound_op(op: AssignOp) -> Option<Instruction> {
    match op {
        AssignOp::Assign => None,
        AssignOp::AddAssign => Some(Instruction::Add),
        AssignOp::SubAssign => Some(Instruction::Sub),
        AssignOp::MulAssign => Some(Instruction::Mul),
        AssignOp::DivAssign => Some(Instruction::Div),
    }
}

fn is_print_call(callee: &[String]) -> bool {
    match callee {
        [single] => single == "print",
        [first, second] => first == "std" && second == "print",
        _ => false,
    }
}
