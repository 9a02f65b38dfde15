//! Field extraction helpers for 32-bit RISC-V instruction words.

/// LOAD major opcode (lb, lh, lw, lbu, lhu).
pub const OPCODE_LOAD: u8 = 0b000_0011;
/// MISC-MEM major opcode (fence, fence.i).
pub const OPCODE_MISC_MEM: u8 = 0b000_1111;
/// OP-IMM major opcode (addi, slti, xori, slli, ...).
pub const OPCODE_OP_IMM: u8 = 0b001_0011;
/// AUIPC major opcode.
pub const OPCODE_AUIPC: u8 = 0b001_0111;
/// STORE major opcode (sb, sh, sw).
pub const OPCODE_STORE: u8 = 0b010_0011;
/// OP major opcode (add, sub, sll, ...).
pub const OPCODE_OP: u8 = 0b011_0011;
/// LUI major opcode.
pub const OPCODE_LUI: u8 = 0b011_0111;
/// BRANCH major opcode (beq, bne, blt, ...).
pub const OPCODE_BRANCH: u8 = 0b110_0011;
/// JALR major opcode.
pub const OPCODE_JALR: u8 = 0b110_0111;
/// JAL major opcode.
pub const OPCODE_JAL: u8 = 0b110_1111;

/// Extract opcode field (bits [6:0]).
#[inline]
pub const fn decode_opcode(instr: u32) -> u8 {
    (instr & 0x7F) as u8
}

/// Extract rd field (bits [11:7]).
#[inline]
pub const fn decode_rd(instr: u32) -> u8 {
    ((instr >> 7) & 0x1F) as u8
}

/// Extract funct3 field (bits [14:12]).
#[inline]
pub const fn decode_funct3(instr: u32) -> u8 {
    ((instr >> 12) & 0x7) as u8
}

/// True if the destination register field is `x0`.
///
/// Writes to `x0` are discarded by the hardware, so a DUT observing register
/// file changes never reports them.
#[inline]
pub const fn writes_to_zero_register(instr: u32) -> bool {
    decode_rd(instr) == 0
}

/// True if the major opcode is LOAD.
#[inline]
pub const fn is_load(instr: u32) -> bool {
    decode_opcode(instr) == OPCODE_LOAD
}

/// True if the major opcode is STORE (any width).
#[inline]
pub const fn is_store(instr: u32) -> bool {
    decode_opcode(instr) == OPCODE_STORE
}
