//! Positional comparison of a reconciled trace against the golden trace.

use std::fmt;

use serde::Serialize;
use tracesync_isa::{is_load, is_store};
use tracing::warn;

use crate::config::Config;
use crate::trace::{CommitRecord, GoldenEntry, ReconciledEntry};

/// First field found to differ between a golden and a DUT record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// PC mismatch.
    Pc,
    /// Instruction word mismatch.
    Instr,
    /// Both wrote a register, but different ones.
    RegDest,
    /// Same register, different value.
    RegValue,
    /// Golden wrote a register, DUT didn't.
    MissingRegWrite,
    /// DUT wrote a register, golden didn't.
    ExtraRegWrite,
    /// Memory address mismatch.
    MemAddr,
    /// Memory value mismatch.
    MemValue,
    /// Golden wrote memory, DUT didn't.
    MissingMemWrite,
    /// DUT wrote memory, golden didn't.
    ExtraMemWrite,
    /// The DUT ran out of retired entries.
    Truncated,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pc => write!(f, "PC mismatch"),
            Self::Instr => write!(f, "instruction mismatch"),
            Self::RegDest => write!(f, "register destination mismatch"),
            Self::RegValue => write!(f, "register value mismatch"),
            Self::MissingRegWrite => write!(f, "missing register write in DUT"),
            Self::ExtraRegWrite => write!(f, "extra register write in DUT"),
            Self::MemAddr => write!(f, "memory address mismatch"),
            Self::MemValue => write!(f, "memory value mismatch"),
            Self::MissingMemWrite => write!(f, "missing memory write in DUT"),
            Self::ExtraMemWrite => write!(f, "extra memory write in DUT"),
            Self::Truncated => write!(f, "DUT trace truncated"),
        }
    }
}

impl MismatchKind {
    /// Classify the first difference between two records, or `None` if equal.
    pub fn between(golden: &CommitRecord, dut: &CommitRecord) -> Option<Self> {
        if golden == dut {
            return None;
        }
        if dut == &CommitRecord::EMPTY {
            return Some(Self::Truncated);
        }
        if golden.pc != dut.pc {
            return Some(Self::Pc);
        }
        if golden.instr != dut.instr {
            return Some(Self::Instr);
        }

        match (golden.target_reg, dut.target_reg) {
            (Some(_), None) => return Some(Self::MissingRegWrite),
            (None, Some(_)) => return Some(Self::ExtraRegWrite),
            (Some(g), Some(d)) if g != d => return Some(Self::RegDest),
            _ => {}
        }
        if golden.reg_val != dut.reg_val {
            return Some(Self::RegValue);
        }

        match (golden.mem_addr, dut.mem_addr) {
            (Some(_), None) => return Some(Self::MissingMemWrite),
            (None, Some(_)) => return Some(Self::ExtraMemWrite),
            (Some(g), Some(d)) if g != d => return Some(Self::MemAddr),
            _ => {}
        }
        // Only the values differ at this point.
        Some(Self::MemValue)
    }
}

/// A golden entry whose DUT counterpart differs after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Position in the golden trace.
    pub index: usize,
    pub kind: MismatchKind,
    /// Normalized golden record.
    pub golden: CommitRecord,
    /// Reconciled DUT record, or [`CommitRecord::EMPTY`] if truncated.
    pub dut: CommitRecord,
}

/// Golden record as the DUT harness could have observed it.
///
/// Load addresses and memory reads are invisible to the harness. With
/// `word_boundary_stores`, store addresses are reduced to their word.
pub fn normalize_golden(entry: &GoldenEntry, config: &Config) -> CommitRecord {
    let mut record = entry.record();
    if is_load(entry.instr) || entry.is_memory_read() {
        record.mem_addr = None;
    }
    if config.word_boundary_stores && is_store(entry.instr) {
        record.mem_addr = record.mem_addr.map(|addr| addr & !0x3);
    }
    record
}

/// Compare every golden entry with the retired DUT entry at the same position.
///
/// Speculative fetches are dropped first. All mismatches are collected; if the
/// DUT runs out of retired entries a final [`MismatchKind::Truncated`] record is
/// emitted and comparison stops.
pub fn compare(golden: &[GoldenEntry], reconciled: &[ReconciledEntry], config: &Config) -> Vec<Mismatch> {
    let mut retired = reconciled.iter().filter(|e| !e.speculative_fetch);
    let mut mismatches = Vec::new();

    for (index, entry) in golden.iter().enumerate() {
        let expected = normalize_golden(entry, config);
        let Some(actual) = retired.next() else {
            warn!(
                "DUT trace truncated at golden entry {index} of {}",
                golden.len()
            );
            mismatches.push(Mismatch {
                index,
                kind: MismatchKind::Truncated,
                golden: expected,
                dut: CommitRecord::EMPTY,
            });
            break;
        };

        let actual = actual.record();
        if let Some(kind) = MismatchKind::between(&expected, &actual) {
            mismatches.push(Mismatch {
                index,
                kind,
                golden: expected,
                dut: actual,
            });
        }
    }

    mismatches
}
