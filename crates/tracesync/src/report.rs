//! Mismatch rendering and persisted per-binary outputs.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use console::style;
use serde::Serialize;

use crate::compare::{Mismatch, MismatchKind};
use crate::error::{Error, Result};
use crate::trace::{CommitRecord, MISMATCH_SUFFIX, RECONCILED_SUFFIX, ReconciledEntry, write_json};

/// Format a 32-bit field as `0x%08x`.
pub fn hex(value: u32) -> String {
    format!("0x{value:08x}")
}

/// [`CommitRecord`] with numeric fields rendered in hex; absent fields stay `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HexRecord {
    pub pc: Option<String>,
    pub instr: Option<String>,
    pub target_reg: Option<u8>,
    pub reg_val: Option<String>,
    pub mem_addr: Option<String>,
    pub mem_val: Option<String>,
}

impl From<&CommitRecord> for HexRecord {
    fn from(record: &CommitRecord) -> Self {
        Self {
            pc: record.pc.map(hex),
            instr: record.instr.map(hex),
            target_reg: record.target_reg,
            reg_val: record.reg_val.map(hex),
            mem_addr: record.mem_addr.map(hex),
            mem_val: record.mem_val.map(hex),
        }
    }
}

/// One entry of `<name>.mismatches.json`.
#[derive(Debug, Clone, Serialize)]
pub struct MismatchEntry {
    pub index: usize,
    pub kind: MismatchKind,
    pub golden: HexRecord,
    pub dut: HexRecord,
}

impl From<&Mismatch> for MismatchEntry {
    fn from(mismatch: &Mismatch) -> Self {
        Self {
            index: mismatch.index,
            kind: mismatch.kind,
            golden: HexRecord::from(&mismatch.golden),
            dut: HexRecord::from(&mismatch.dut),
        }
    }
}

/// Files written for one verified binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    pub reconciled: PathBuf,
    pub mismatches: PathBuf,
}

/// Write `<name>.final.json` and `<name>.mismatches.json` into `dir`.
pub fn write_outputs(
    dir: &Path,
    name: &str,
    reconciled: &[ReconciledEntry],
    mismatches: &[Mismatch],
) -> Result<OutputFiles> {
    std::fs::create_dir_all(dir).map_err(|e| Error::file(dir, e))?;

    let files = OutputFiles {
        reconciled: dir.join(format!("{name}{RECONCILED_SUFFIX}")),
        mismatches: dir.join(format!("{name}{MISMATCH_SUFFIX}")),
    };
    write_json(&files.reconciled, reconciled)?;
    let entries: Vec<MismatchEntry> = mismatches.iter().map(MismatchEntry::from).collect();
    write_json(&files.mismatches, &entries)?;
    Ok(files)
}

fn render_record(out: &mut String, label: &str, record: &CommitRecord) {
    let field = |value: Option<u32>| value.map_or_else(|| "-".to_string(), hex);
    let _ = write!(
        out,
        "  {label:<6} pc={} instr={}",
        field(record.pc),
        field(record.instr)
    );
    if let Some(reg) = record.target_reg {
        let _ = write!(out, " x{reg}={}", field(record.reg_val));
    }
    if record.mem_addr.is_some() || record.mem_val.is_some() {
        let _ = write!(
            out,
            " mem[{}]={}",
            field(record.mem_addr),
            field(record.mem_val)
        );
    }
    out.push('\n');
}

/// Render a human-readable mismatch report for one binary.
pub fn render_mismatches(name: &str, mismatches: &[Mismatch]) -> String {
    let mut out = String::new();
    if mismatches.is_empty() {
        let _ = writeln!(out, "{}", style(format!("No mismatches found for {name}")).green());
        return out;
    }

    let _ = writeln!(
        out,
        "{}",
        style(format!("{} mismatch(es) found for {name}", mismatches.len()))
            .red()
            .bold()
    );
    for mismatch in mismatches {
        let _ = writeln!(out, "#{} {}", mismatch.index, mismatch.kind);
        render_record(&mut out, "golden", &mismatch.golden);
        render_record(&mut out, "dut", &mismatch.dut);
    }
    out
}
