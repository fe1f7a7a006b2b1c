//! Bytecode opcodes for the clause VM
//!
//! Opcodes are grouped by category in contiguous ranges. Operands follow the
//! opcode byte little-endian: `u16` for environment slots, argument indexes
//! and cut registers; `u32` for constant/tag pool indexes and jump targets.

use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // === Term Construction (0x00-0x0F) ===
    /// No operation
    Nop = 0x00,
    /// Push constant from pool, index is next 4 bytes
    PushConstant = 0x01,
    /// Push environment slot, index is next 2 bytes
    PushEnv = 0x02,
    /// Push a fresh unbound variable
    CreateVariable = 0x03,
    /// Pop `arity` terms and push the compound; tag index is next 4 bytes
    CreateCompound = 0x04,

    // === Clause Entry (0x10-0x1F) ===
    /// Open a clause environment of N fresh variables, N is next 2 bytes
    Allocate = 0x10,
    /// Pop a term and unify it with argument I, I is next 2 bytes
    UnifyArg = 0x11,
    /// Store argument J into environment slot I without unification
    /// (first occurrence of a head variable); I then J, 2 bytes each
    BindArg = 0x12,

    // === Control (0x20-0x2F) ===
    /// Pop `arity` arguments and call the predicate; tag index is next 4 bytes
    Call = 0x20,
    /// Jump to absolute offset, next 4 bytes
    Jump = 0x21,
    /// Clause body finished
    Proceed = 0x22,

    // === Nondeterminism (0x30-0x3F) ===
    /// Push an alternative resuming at the absolute offset in the next 4 bytes
    TryMeElse = 0x30,
    /// First instruction of the last alternative
    TrustMe = 0x31,
    /// Save the choice stack height in cut register R, next 2 bytes
    MarkChoice = 0x32,
    /// Cut back to the height saved in register R, next 2 bytes
    CutTo = 0x33,
    /// Cut back to the activation's entry height
    Cut = 0x34,
    /// Backtrack
    Fail = 0x35,
}

impl Opcode {
    /// Convert byte to opcode, returns None if invalid
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Self> {
        OPCODE_TABLE.get(byte as usize).copied().flatten()
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Get the number of immediate bytes following this opcode
    #[inline]
    pub fn immediate_size(self) -> usize {
        match self {
            Self::Nop
            | Self::CreateVariable
            | Self::Proceed
            | Self::TrustMe
            | Self::Cut
            | Self::Fail => 0,

            Self::PushEnv | Self::Allocate | Self::UnifyArg | Self::MarkChoice | Self::CutTo => 2,

            Self::PushConstant
            | Self::CreateCompound
            | Self::BindArg
            | Self::Call
            | Self::Jump
            | Self::TryMeElse => 4,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::PushConstant => "push_constant",
            Self::PushEnv => "push_env",
            Self::CreateVariable => "create_variable",
            Self::CreateCompound => "create_compound",
            Self::Allocate => "allocate",
            Self::UnifyArg => "unify_arg",
            Self::BindArg => "bind_arg",
            Self::Call => "call",
            Self::Jump => "jump",
            Self::Proceed => "proceed",
            Self::TryMeElse => "try_me_else",
            Self::TrustMe => "trust_me",
            Self::MarkChoice => "mark_choice",
            Self::CutTo => "cut_to",
            Self::Cut => "cut",
            Self::Fail => "fail",
        }
    }

    #[inline]
    pub fn is_jump(self) -> bool {
        matches!(self, Self::Jump | Self::TryMeElse)
    }

    #[inline]
    pub fn is_terminator(self) -> bool {
        matches!(self, Self::Proceed | Self::Fail)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Lookup table for byte -> Opcode conversion
static OPCODE_TABLE: [Option<Opcode>; 256] = {
    let mut table = [None; 256];

    table[0x00] = Some(Opcode::Nop);
    table[0x01] = Some(Opcode::PushConstant);
    table[0x02] = Some(Opcode::PushEnv);
    table[0x03] = Some(Opcode::CreateVariable);
    table[0x04] = Some(Opcode::CreateCompound);

    table[0x10] = Some(Opcode::Allocate);
    table[0x11] = Some(Opcode::UnifyArg);
    table[0x12] = Some(Opcode::BindArg);

    table[0x20] = Some(Opcode::Call);
    table[0x21] = Some(Opcode::Jump);
    table[0x22] = Some(Opcode::Proceed);

    table[0x30] = Some(Opcode::TryMeElse);
    table[0x31] = Some(Opcode::TrustMe);
    table[0x32] = Some(Opcode::MarkChoice);
    table[0x33] = Some(Opcode::CutTo);
    table[0x34] = Some(Opcode::Cut);
    table[0x35] = Some(Opcode::Fail);

    table
};
