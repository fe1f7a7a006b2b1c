//! Bytecode chunk representation
//!
//! A chunk holds the compiled code of one predicate (every clause, one entry
//! point each) together with its constant pool of ground terms and its pool
//! of functor/arity tags. Chunks are immutable after compilation and shared
//! between execution contexts through `Arc`.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use super::opcodes::Opcode;
use crate::backend::models::{Tag, Term};

/// A compiled bytecode chunk
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The bytecode instructions
    code: Vec<u8>,

    /// Ground terms referenced by `push_constant`
    constants: Vec<Term>,

    /// Tags referenced by `create_compound` and `call`
    tags: Vec<Tag>,

    /// Name of this chunk (for debugging)
    name: String,

    /// Number of cut registers used by `mark_choice`/`cut_to`
    register_count: u16,
}

/// Handle to a forward jump operand awaiting its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLabel {
    operand_offset: usize,
}

/// Builder for constructing chunks
#[derive(Debug)]
pub struct ChunkBuilder {
    code: Vec<u8>,
    constants: Vec<Term>,
    constant_index: HashMap<Term, u32>,
    tags: Vec<Tag>,
    tag_index: HashMap<Tag, u32>,
    name: String,
    register_count: u16,
}

impl Chunk {
    /// Create a builder for constructing a chunk
    pub fn builder(name: impl Into<String>) -> ChunkBuilder {
        ChunkBuilder::new(name)
    }

    /// Get the bytecode instructions
    #[inline]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[inline]
    pub fn read_opcode(&self, offset: usize) -> Option<Opcode> {
        self.code.get(offset).and_then(|&b| Opcode::from_byte(b))
    }

    /// Read a little-endian u16 operand
    #[inline]
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian u32 operand
    #[inline]
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let bytes = self.code.get(offset..offset + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    #[inline]
    pub fn constant(&self, index: u32) -> Option<&Term> {
        self.constants.get(index as usize)
    }

    #[inline]
    pub fn constants(&self) -> &[Term] {
        &self.constants
    }

    #[inline]
    pub fn tag(&self, index: u32) -> Option<Tag> {
        self.tags.get(index as usize).copied()
    }

    #[inline]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn register_count(&self) -> u16 {
        self.register_count
    }

    /// Disassemble the chunk to a string
    pub fn disassemble(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "=== {} ===", self.name);
        let _ = writeln!(
            output,
            "constants: {}, tags: {}, registers: {}",
            self.constants.len(),
            self.tags.len(),
            self.register_count
        );

        let mut offset = 0;
        while offset < self.code.len() {
            let (disasm, next_offset) = self.disassemble_instruction(offset);
            let _ = writeln!(output, "{:04x} {}", offset, disasm);
            offset = next_offset;
        }
        output
    }

    /// Disassemble a single instruction, returns (string, next_offset)
    pub fn disassemble_instruction(&self, offset: usize) -> (String, usize) {
        let Some(opcode) = self.read_opcode(offset) else {
            return (
                format!("??? (0x{:02x})", self.code.get(offset).copied().unwrap_or(0)),
                offset + 1,
            );
        };

        let next_offset = offset + 1 + opcode.immediate_size();
        let at = offset + 1;
        let operand_str = match opcode {
            Opcode::PushConstant => {
                let index = self.read_u32(at).unwrap_or(0);
                let text = self
                    .constant(index)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "???".to_string());
                format!(" #{} ({})", index, text)
            }
            Opcode::CreateCompound | Opcode::Call => {
                let index = self.read_u32(at).unwrap_or(0);
                let text = self
                    .tag(index)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "???".to_string());
                format!(" #{} ({})", index, text)
            }
            Opcode::Jump | Opcode::TryMeElse => {
                format!(" -> {:04x}", self.read_u32(at).unwrap_or(0))
            }
            Opcode::BindArg => format!(
                " env[{}] <- arg[{}]",
                self.read_u16(at).unwrap_or(0),
                self.read_u16(at + 2).unwrap_or(0)
            ),
            Opcode::PushEnv | Opcode::Allocate | Opcode::UnifyArg | Opcode::MarkChoice
            | Opcode::CutTo => format!(" {}", self.read_u16(at).unwrap_or(0)),
            _ => String::new(),
        };

        (format!("{}{}", opcode.mnemonic(), operand_str), next_offset)
    }
}

impl ChunkBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            code: Vec::with_capacity(64),
            constants: Vec::new(),
            constant_index: HashMap::new(),
            tags: Vec::new(),
            tag_index: HashMap::new(),
            name: name.into(),
            register_count: 0,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current bytecode offset
    #[inline]
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Emit an opcode without operands
    pub fn emit(&mut self, opcode: Opcode) {
        debug_assert_eq!(opcode.immediate_size(), 0, "{} takes operands", opcode);
        self.code.push(opcode.to_byte());
    }

    /// Emit an opcode with a 2-byte operand
    pub fn emit_u16(&mut self, opcode: Opcode, operand: u16) {
        debug_assert_eq!(opcode.immediate_size(), 2, "{} operand size", opcode);
        self.code.push(opcode.to_byte());
        self.code.extend_from_slice(&operand.to_le_bytes());
    }

    /// Emit an opcode with a 4-byte operand
    pub fn emit_u32(&mut self, opcode: Opcode, operand: u32) {
        debug_assert_eq!(opcode.immediate_size(), 4, "{} operand size", opcode);
        self.code.push(opcode.to_byte());
        self.code.extend_from_slice(&operand.to_le_bytes());
    }

    /// `bind_arg slot, arg`
    pub fn emit_bind_arg(&mut self, slot: u16, arg: u16) {
        self.code.push(Opcode::BindArg.to_byte());
        self.code.extend_from_slice(&slot.to_le_bytes());
        self.code.extend_from_slice(&arg.to_le_bytes());
    }

    /// Add a ground term to the pool, returns its index
    pub fn add_constant(&mut self, value: Term) -> u32 {
        if let Some(&index) = self.constant_index.get(&value) {
            return index;
        }
        let index = self.constants.len() as u32;
        self.constant_index.insert(value.clone(), index);
        self.constants.push(value);
        index
    }

    pub fn emit_constant(&mut self, value: Term) {
        let index = self.add_constant(value);
        self.emit_u32(Opcode::PushConstant, index);
    }

    /// Add a tag to the pool, returns its index
    pub fn add_tag(&mut self, tag: Tag) -> u32 {
        if let Some(&index) = self.tag_index.get(&tag) {
            return index;
        }
        let index = self.tags.len() as u32;
        self.tag_index.insert(tag, index);
        self.tags.push(tag);
        index
    }

    pub fn emit_create_compound(&mut self, tag: Tag) {
        let index = self.add_tag(tag);
        self.emit_u32(Opcode::CreateCompound, index);
    }

    pub fn emit_call(&mut self, tag: Tag) {
        let index = self.add_tag(tag);
        self.emit_u32(Opcode::Call, index);
    }

    /// Reserve a fresh cut register
    pub fn new_register(&mut self) -> u16 {
        let register = self.register_count;
        self.register_count += 1;
        register
    }

    /// Emit a jump-style instruction with a placeholder target
    pub fn emit_jump(&mut self, opcode: Opcode) -> JumpLabel {
        debug_assert!(opcode.is_jump());
        self.code.push(opcode.to_byte());
        let operand_offset = self.code.len();
        self.code.extend_from_slice(&u32::MAX.to_le_bytes());
        JumpLabel { operand_offset }
    }

    /// Point `label` at the current offset
    pub fn patch_jump(&mut self, label: JumpLabel) {
        let target = self.code.len() as u32;
        self.code[label.operand_offset..label.operand_offset + 4]
            .copy_from_slice(&target.to_le_bytes());
    }

    pub fn build(self) -> Chunk {
        Chunk {
            code: self.code,
            constants: self.constants,
            tags: self.tags,
            name: self.name,
            register_count: self.register_count,
        }
    }

    pub fn build_arc(self) -> Arc<Chunk> {
        Arc::new(self.build())
    }
}
