//! RISC-V instruction classification for commit-trace reconciliation.
//!
//! Only the fields needed to decide which DUT observation stream an
//! instruction's effect lands in are decoded: the major opcode, `funct3`
//! (to tell store widths apart) and the destination register.

mod category;
mod encode;

pub use category::*;
pub use encode::*;
