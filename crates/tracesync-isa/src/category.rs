//! Instruction categories as seen by a fragmented DUT trace.

use std::fmt;

use crate::encode::*;

/// Which observable effect an instruction has on a DUT.
///
/// The category decides which fragmented stream (register commits, memory
/// accesses, or neither) an instruction is matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// lb, lh, lw, lbu, lhu.
    Load,
    /// sb.
    StoreByte,
    /// sh.
    StoreHalf,
    /// sw.
    StoreWord,
    /// beq, bne, blt, bge, bltu, bgeu.
    Branch,
    /// jal, jalr.
    Jump,
    /// lui, auipc, OP-IMM and OP.
    RegisterOp,
    /// fence, fence.i.
    Fence,
    /// Anything outside the recognized subset.
    Unknown,
}

impl Category {
    /// Width of the store performed, if this is a store.
    pub const fn store_width(self) -> Option<StoreWidth> {
        match self {
            Self::StoreByte => Some(StoreWidth::Byte),
            Self::StoreHalf => Some(StoreWidth::Half),
            Self::StoreWord => Some(StoreWidth::Word),
            _ => None,
        }
    }

    /// True for categories whose result lands in the register file.
    pub const fn writes_register(self) -> bool {
        matches!(self, Self::Load | Self::RegisterOp | Self::Jump)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::StoreByte => write!(f, "store byte"),
            Self::StoreHalf => write!(f, "store half"),
            Self::StoreWord => write!(f, "store word"),
            Self::Branch => write!(f, "branch"),
            Self::Jump => write!(f, "jump"),
            Self::RegisterOp => write!(f, "register op"),
            Self::Fence => write!(f, "fence"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify a 32-bit instruction word. Total: unrecognized encodings map to
/// [`Category::Unknown`].
pub const fn classify(instr: u32) -> Category {
    match decode_opcode(instr) {
        OPCODE_LOAD => Category::Load,
        OPCODE_STORE => match decode_funct3(instr) {
            0b000 => Category::StoreByte,
            0b001 => Category::StoreHalf,
            0b010 => Category::StoreWord,
            _ => Category::Unknown,
        },
        OPCODE_BRANCH => Category::Branch,
        OPCODE_JAL | OPCODE_JALR => Category::Jump,
        OPCODE_LUI | OPCODE_AUIPC | OPCODE_OP_IMM | OPCODE_OP => Category::RegisterOp,
        OPCODE_MISC_MEM => Category::Fence,
        _ => Category::Unknown,
    }
}

/// Store access width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreWidth {
    Byte,
    Half,
    Word,
}

impl StoreWidth {
    /// Width in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Narrow a raw 32-bit bus word to the bytes actually stored.
    ///
    /// The byte lane is selected by the low two bits of the exact store
    /// address (`shift = 8 * (addr & 3)`). Word stores keep the full bus word.
    pub const fn narrow(self, raw: u32, addr: u32) -> u32 {
        let shift = 8 * (addr & 0b11);
        match self {
            Self::Byte => (raw >> shift) & 0xFF,
            Self::Half => (raw >> shift) & 0xFFFF,
            Self::Word => raw,
        }
    }
}
