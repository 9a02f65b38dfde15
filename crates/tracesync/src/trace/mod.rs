//! Trace data model.
//!
//! The golden simulator produces one [`GoldenEntry`] per retired instruction.
//! The DUT harness produces a [`FragmentedTrace`]: three unlinked streams of
//! fetches, register-file changes and memory writes. Reconciliation turns the
//! latter into [`ReconciledEntry`] records that line up with the former.

mod io;
mod spike;


pub use io::*;
pub use spike::*;

use serde::{Deserialize, Deserializer, Serialize};

/// Number of architectural integer registers.
pub const NUM_REGS: usize = 32;

/// One instruction retired by the golden simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenEntry {
    /// Program counter.
    pub pc: u32,
    /// Raw instruction word.
    pub instr: u32,
    /// Destination register (if any).
    #[serde(default, deserialize_with = "register_index")]
    pub target_reg: Option<u8>,
    /// Value written to `target_reg`.
    pub reg_val: Option<u32>,
    /// Memory address accessed (if any).
    pub mem_addr: Option<u32>,
    /// Value written to memory (stores only).
    pub mem_val: Option<u32>,
}

fn register_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let reg = Option::<u8>::deserialize(deserializer)?;
    match reg {
        Some(r) if usize::from(r) >= NUM_REGS => Err(serde::de::Error::custom(format!(
            "register index {r} out of range (0..{NUM_REGS})"
        ))),
        _ => Ok(reg),
    }
}

impl GoldenEntry {
    /// Register write performed by this instruction, if any.
    pub fn register_write(&self) -> Option<RegCommit> {
        match (self.target_reg, self.reg_val) {
            (Some(reg), Some(value)) => Some(RegCommit { reg, value }),
            _ => None,
        }
    }

    /// True if the simulator reported an address but no written value.
    /// The DUT harness never observes reads.
    pub const fn is_memory_read(&self) -> bool {
        self.mem_addr.is_some() && self.mem_val.is_none()
    }

    /// View as a comparison record.
    pub const fn record(&self) -> CommitRecord {
        CommitRecord {
            pc: Some(self.pc),
            instr: Some(self.instr),
            target_reg: self.target_reg,
            reg_val: self.reg_val,
            mem_addr: self.mem_addr,
            mem_val: self.mem_val,
        }
    }
}

/// Instruction fetch observed on the DUT bus. Serialized as `[pc, instr]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Fetch {
    pub pc: u32,
    pub instr: u32,
}

impl From<(u32, u32)> for Fetch {
    fn from((pc, instr): (u32, u32)) -> Self {
        Self { pc, instr }
    }
}

impl From<Fetch> for (u32, u32) {
    fn from(fetch: Fetch) -> Self {
        (fetch.pc, fetch.instr)
    }
}

/// Observed change of a register-file entry. Serialized as `[reg, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u8, u32)", into = "(u8, u32)")]
pub struct RegCommit {
    pub reg: u8,
    pub value: u32,
}

impl From<(u8, u32)> for RegCommit {
    fn from((reg, value): (u8, u32)) -> Self {
        Self { reg, value }
    }
}

impl From<RegCommit> for (u8, u32) {
    fn from(commit: RegCommit) -> Self {
        (commit.reg, commit.value)
    }
}

/// Memory write observed on the DUT bus. `raw` is the full bus word before
/// narrowing to the store width. Serialized as `[addr, raw]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct MemAccess {
    pub addr: u32,
    pub raw: u32,
}

impl From<(u32, u32)> for MemAccess {
    fn from((addr, raw): (u32, u32)) -> Self {
        Self { addr, raw }
    }
}

impl From<MemAccess> for (u32, u32) {
    fn from(access: MemAccess) -> Self {
        (access.addr, access.raw)
    }
}

/// The DUT's raw observation streams. Index-addressed, never keyed by pc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentedTrace {
    /// Every fetch, including speculative ones that never retire.
    pub fetches: Vec<Fetch>,
    /// One entry per observed register value change.
    pub regfile_commits: Vec<RegCommit>,
    /// Memory writes at bus granularity.
    #[serde(default)]
    pub memory_accesses: Vec<MemAccess>,
}

/// One consumed DUT fetch after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledEntry {
    pub pc: u32,
    pub instr: u32,
    pub target_reg: Option<u8>,
    pub reg_val: Option<u32>,
    pub mem_addr: Option<u32>,
    pub mem_val: Option<u32>,
    /// Fetched but never retired at this program-order position.
    pub speculative_fetch: bool,
    /// Register effect synthesized for a same-value rewrite the DUT could not observe.
    pub speculative_commit: bool,
}

impl ReconciledEntry {
    /// Entry carrying only the fetch, with no register or memory effect.
    pub const fn fetch_only(fetch: Fetch) -> Self {
        Self {
            pc: fetch.pc,
            instr: fetch.instr,
            target_reg: None,
            reg_val: None,
            mem_addr: None,
            mem_val: None,
            speculative_fetch: false,
            speculative_commit: false,
        }
    }

    /// Comparison record with the speculative flags stripped.
    pub const fn record(&self) -> CommitRecord {
        CommitRecord {
            pc: Some(self.pc),
            instr: Some(self.instr),
            target_reg: self.target_reg,
            reg_val: self.reg_val,
            mem_addr: self.mem_addr,
            mem_val: self.mem_val,
        }
    }
}

/// Field set shared by golden and reconciled entries, used for comparison.
///
/// Every field is optional so a truncated DUT trace can be represented by
/// [`CommitRecord::EMPTY`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub pc: Option<u32>,
    pub instr: Option<u32>,
    pub target_reg: Option<u8>,
    pub reg_val: Option<u32>,
    pub mem_addr: Option<u32>,
    pub mem_val: Option<u32>,
}

impl CommitRecord {
    /// Sentinel with every field absent.
    pub const EMPTY: Self = Self {
        pc: None,
        instr: None,
        target_reg: None,
        reg_val: None,
        mem_addr: None,
        mem_val: None,
    };
}
