/// A forward-referenceable position in a function's code. Labels are
/// symbolic while instructions are being emitted and resolve to byte offsets
/// when the function is encoded.
pub type Label = usize;

/// The Vela VM instruction set. Operand stack machine; locals are indexed
/// slots split into an integer family (ints and bools) and a reference
/// family (strings, structs, tagged unions, boxed values).
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// Pseudo-instruction fixing a label's position; encodes to nothing.
    Mark(Label),

    PushInt(i32),
    PushBool(bool),
    PushStr(String),

    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Not,

    IntEq,
    IntNe,
    IntLt,
    IntLe,
    IntGt,
    IntGe,
    /// Structural equality on reference-category values.
    ValueEq,
    ValueNe,

    LoadInt(u16),
    StoreInt(u16),
    LoadRef(u16),
    StoreRef(u16),

    Jump(Label),
    JumpIfFalse(Label),
    JumpIfTrue(Label),
    /// Pops an integer tag and jumps to `targets[tag]`; falls through on an
    /// out-of-range tag.
    JumpTable(Vec<Label>),

    Call {
        owner: String,
        name: String,
        argc: u8,
    },

    NewStruct {
        type_name: String,
        /// Field names in push order; values are popped in reverse.
        fields: Vec<String>,
    },
    GetField(String),

    NewUnion {
        type_name: String,
        tag: u8,
        has_payload: bool,
    },
    /// Pops a tagged union, pushes its integer tag.
    GetTag,
    /// Pops a tagged union, pushes its payload; traps if the tag differs.
    GetPayload(u8),

    BoxInt,
    BoxBool,
    UnboxInt,
    UnboxBool,
    /// Pops any reference-category value, pushes its textual form.
    AnyToStr,
    /// Pops two strings, pushes their concatenation.
    Concat,

    PrintInt,
    PrintBool,
    PrintStr,
    PrintRef,

    Pop,
    Dup,

    Return,
    ReturnValue,

    /// Unconditional runtime failure with a message, e.g. a match that
    /// falls through every arm.
    Trap(String),
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Mark(_) => 0x00,
            Instruction::PushInt(_) => 0x01,
            Instruction::PushBool(_) => 0x02,
            Instruction::PushStr(_) => 0x03,
            Instruction::Add => 0x10,
            Instruction::Sub => 0x11,
            Instruction::Mul => 0x12,
            Instruction::Div => 0x13,
            Instruction::Neg => 0x14,
            Instruction::Not => 0x15,
            Instruction::IntEq => 0x20,
            Instruction::IntNe => 0x21,
            Instruction::IntLt => 0x22,
            Instruction::IntLe => 0x23,
            Instruction::IntGt => 0x24,
            Instruction::IntGe => 0x25,
            Instruction::ValueEq => 0x26,
            Instruction::ValueNe => 0x27,
            Instruction::LoadInt(_) => 0x30,
            Instruction::StoreInt(_) => 0x31,
            Instruction::LoadRef(_) => 0x32,
            Instruction::StoreRef(_) => 0x33,
            Instruction::Jump(_) => 0x40,
            Instruction::JumpIfFalse(_) => 0x41,
            Instruction::JumpIfTrue(_) => 0x42,
            Instruction::JumpTable(_) => 0x43,
            Instruction::Call { .. } => 0x50,
            Instruction::NewStruct { .. } => 0x60,
            Instruction::GetField(_) => 0x61,
            Instruction::NewUnion { .. } => 0x62,
            Instruction::GetTag => 0x63,
            Instruction::GetPayload(_) => 0x64,
            Instruction::BoxInt => 0x70,
            Instruction::BoxBool => 0x71,
            Instruction::UnboxInt => 0x72,
            Instruction::UnboxBool => 0x73,
            Instruction::AnyToStr => 0x74,
            Instruction::Concat => 0x75,
            Instruction::PrintInt => 0x80,
            Instruction::PrintBool => 0x81,
            Instruction::PrintStr => 0x82,
            Instruction::PrintRef => 0x83,
            Instruction::Pop => 0x90,
            Instruction::Dup => 0x91,
            Instruction::Return => 0xA0,
            Instruction::ReturnValue => 0xA1,
            Instruction::Trap(_) => 0xF0,
        }
    }

    /// Encoded size in bytes, used for label resolution before encoding.
    pub fn encoded_len(&self) -> usize {
        match self {
            Instruction::Mark(_) => 0,
            Instruction::PushInt(_) => 5,
            Instruction::PushBool(_) => 2,
            Instruction::PushStr(_) => 3,
            Instruction::LoadInt(_)
            | Instruction::StoreInt(_)
            | Instruction::LoadRef(_)
            | Instruction::StoreRef(_) => 3,
            Instruction::Jump(_) | Instruction::JumpIfFalse(_) | Instruction::JumpIfTrue(_) => 5,
            Instruction::JumpTable(targets) => 1 + 2 + targets.len() * 4,
            Instruction::Call { .. } => 1 + 2 + 2 + 1,
            Instruction::NewStruct { fields, .. } => 1 + 2 + 1 + fields.len() * 2,
            Instruction::GetField(_) => 3,
            Instruction::NewUnion { .. } => 1 + 2 + 1 + 1,
            Instruction::GetPayload(_) => 2,
            Instruction::Trap(_) => 3,
            _ => 1,
        }
    }
}
