use super::codegen::CodegenError;
use super::instruction::{Instruction, Label};
use log::trace;
use std::collections::HashMap;

pub const MODULE_MAGIC: &[u8; 4] = b"VBM1";
pub const MODULE_VERSION: u16 = 1;

/// One generated unit of executable code, named so the archive and the VM
/// loader can address it.
#[derive(Clone, Debug)]
pub struct BinaryModule {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Code for a single function, still in symbolic form. Labels are resolved
/// to byte offsets when the owning module is encoded.
#[derive(Debug)]
pub struct FunctionCode {
    pub name: String,
    pub argc: u8,
    pub max_slots: u16,
    pub code: Vec<Instruction>,
    next_label: Label,
}

impl FunctionCode {
    pub fn new(name: &str, argc: u8) -> Self {
        FunctionCode {
            name: name.to_string(),
            argc,
            max_slots: 0,
            code: Vec::new(),
            next_label: 0,
        }
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    pub fn new_label(&mut self) -> Label {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    pub fn mark(&mut self, label: Label) {
        self.code.push(Instruction::Mark(label));
    }
}

/// Assembles functions into one encoded binary module with a shared string
/// pool.
#[derive(Debug)]
pub struct ModuleBuilder {
    name: String,
    functions: Vec<FunctionCode>,
}

impl ModuleBuilder {
    pub fn new(name: &str) -> Self {
        ModuleBuilder {
            name: name.to_string(),
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, function: FunctionCode) {
        self.functions.push(function);
    }

    pub fn finish(self) -> Result<BinaryModule, CodegenError> {
        let mut pool = StringPool::new();
        let mut encoded_functions = Vec::new();
        for function in &self.functions {
            let code = encode_function(function, &mut pool)?;
            let name_index = pool.intern(&function.name);
            encoded_functions.push((name_index, function.argc, function.max_slots, code));
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(MODULE_MAGIC);
        write_u16(&mut bytes, MODULE_VERSION);
        write_str(&mut bytes, &self.name);
        write_u16(&mut bytes, pool.strings.len() as u16);
        for entry in &pool.strings {
            write_str(&mut bytes, entry);
        }
        write_u16(&mut bytes, encoded_functions.len() as u16);
        for (name_index, argc, max_slots, code) in encoded_functions {
            write_u16(&mut bytes, name_index);
            bytes.push(argc);
            write_u16(&mut bytes, max_slots);
            write_u32(&mut bytes, code.len() as u32);
            bytes.extend_from_slice(&code);
        }

        trace!(target: "codegen", "Encoded module {} ({} bytes)", self.name, bytes.len());
        Ok(BinaryModule {
            name: self.name,
            bytes,
        })
    }
}

struct StringPool {
    strings: Vec<String>,
    indices: HashMap<String, u16>,
}

impl StringPool {
    fn new() -> Self {
        StringPool {
            strings: Vec::new(),
            indices: HashMap::new(),
        }
    }

    fn intern(&mut self, value: &str) -> u16 {
        if let Some(index) = self.indices.get(value) {
            return *index;
        }
        let index = self.strings.len() as u16;
        self.strings.push(value.to_string());
        self.indices.insert(value.to_string(), index);
        index
    }
}

fn encode_function(function: &FunctionCode, pool: &mut StringPool) -> Result<Vec<u8>, CodegenError> {
    // Pass 1: byte offset of every label.
    let mut offsets: HashMap<Label, u32> = HashMap::new();
    let mut offset = 0u32;
    for instruction in &function.code {
        if let Instruction::Mark(label) = instruction {
            offsets.insert(*label, offset);
        }
        offset += instruction.encoded_len() as u32;
    }

    let resolve = |label: &Label| -> Result<u32, CodegenError> {
        offsets.get(label).copied().ok_or_else(|| {
            CodegenError::internal(format!(
                "unresolved jump target in function '{}'",
                function.name
            ))
        })
    };

    // Pass 2: encode.
    let mut code = Vec::new();
    for instruction in &function.code {
        if matches!(instruction, Instruction::Mark(_)) {
            continue;
        }
        code.push(instruction.opcode());
        match instruction {
            Instruction::PushInt(value) => code.extend_from_slice(&value.to_be_bytes()),
            Instruction::PushBool(value) => code.push(*value as u8),
            Instruction::PushStr(value) => write_u16(&mut code, pool.intern(value)),
            Instruction::LoadInt(slot)
            | Instruction::StoreInt(slot)
            | Instruction::LoadRef(slot)
            | Instruction::StoreRef(slot) => write_u16(&mut code, *slot),
            Instruction::Jump(label)
            | Instruction::JumpIfFalse(label)
            | Instruction::JumpIfTrue(label) => {
                code.extend_from_slice(&resolve(label)?.to_be_bytes())
            }
            Instruction::JumpTable(targets) => {
                write_u16(&mut code, targets.len() as u16);
                for target in targets {
                    code.extend_from_slice(&resolve(target)?.to_be_bytes());
                }
            }
            Instruction::Call { owner, name, argc } => {
                write_u16(&mut code, pool.intern(owner));
                write_u16(&mut code, pool.intern(name));
                code.push(*argc);
            }
            Instruction::NewStruct { type_name, fields } => {
                write_u16(&mut code, pool.intern(type_name));
                code.push(fields.len() as u8);
                for field in fields {
                    write_u16(&mut code, pool.intern(field));
                }
            }
            Instruction::GetField(name) => write_u16(&mut code, pool.intern(name)),
            Instruction::NewUnion {
                type_name,
                tag,
                has_payload,
            } => {
                write_u16(&mut code, pool.intern(type_name));
                code.push(*tag);
                code.push(*has_payload as u8);
            }
            Instruction::GetPayload(tag) => code.push(*tag),
            Instruction::Trap(message) => write_u16(&mut code, pool.intern(message)),
            _ => {}
        }
    }
    Ok(code)
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_str(bytes: &mut Vec<u8>, value: &str) {
    write_u16(bytes, value.len() as u16);
    bytes.extend_from_slice(value.as_bytes());
}
