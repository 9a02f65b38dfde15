use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::{GoldenEntry, NUM_REGS};
use crate::config::GoldenFilter;
use crate::error::{Error, Result};

/// `li ra, 1`: first instruction of the riscv-arch-test cleanup sequence.
const CLEANUP_LI_RA_1: u32 = 0x0010_0093;
/// `auipc t2, 0x1`: second instruction of the cleanup sequence.
const CLEANUP_AUIPC_T2: u32 = 0x0000_1397;

impl GoldenEntry {
    /// Parse a Spike `--log-commits` line.
    ///
    /// Format: `core   0: 3 0x<PC> (0x<INSN>) [x<RD> 0x<VALUE>] [mem 0x<ADDR> [0x<VAL>]]`.
    ///
    /// Returns `Ok(None)` for lines that are not commit records (warnings,
    /// program output). CSR annotations such as `c773_mtvec 0x...` are not
    /// register writes. Writes to `x0` are dropped since no hardware can
    /// observe them.
    pub fn parse_spike(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.to_ascii_lowercase().starts_with("warning:") {
            return Ok(None);
        }

        let pattern = COMMIT_PATTERN.get_or_init(|| {
            Regex::new(concat!(
                r"core\s+\d+:\s+\d+\s+",
                r"0x(?P<pc>[0-9a-fA-F]+)\s+",
                r"\(0x(?P<instr>[0-9a-fA-F]+)\)",
                r"(?:\s+x(?P<rd>\d+)\s+0x(?P<rd_val>[0-9a-fA-F]+))?",
                r"(?:\s+mem\s+0x(?P<mem_addr>[0-9a-fA-F]+)(?:\s+0x(?P<mem_val>[0-9a-fA-F]+))?)?",
            ))
            .unwrap()
        });
        let Some(caps) = pattern.captures(line) else {
            return Ok(None);
        };

        let pc = hex_field(&caps, "pc")?.ok_or("missing pc")?;
        let instr = hex_field(&caps, "instr")?.ok_or("missing instruction")?;

        let (target_reg, reg_val) = match caps.name("rd") {
            Some(rd) => {
                let reg = rd
                    .as_str()
                    .parse::<u8>()
                    .ok()
                    .filter(|&r| usize::from(r) < NUM_REGS)
                    .ok_or_else(|| format!("invalid register x{}", rd.as_str()))?;
                let value = hex_field(&caps, "rd_val")?;
                if reg == 0 { (None, None) } else { (Some(reg), value) }
            }
            None => (None, None),
        };

        Ok(Some(Self {
            pc,
            instr,
            target_reg,
            reg_val,
            mem_addr: hex_field(&caps, "mem_addr")?,
            mem_val: hex_field(&caps, "mem_val")?,
        }))
    }
}

fn hex_field(caps: &Captures<'_>, name: &str) -> std::result::Result<Option<u32>, String> {
    let Some(m) = caps.name(name) else {
        return Ok(None);
    };
    let wide = u64::from_str_radix(m.as_str(), 16)
        .map_err(|e| format!("invalid {name} 0x{}: {e}", m.as_str()))?;
    u32::try_from(wide)
        .map(Some)
        .map_err(|_| format!("{name} 0x{wide:x} does not fit in 32 bits"))
}

/// Parse a Spike commit log into golden entries, in retirement order.
pub fn parse_commit_log(path: &Path) -> Result<Vec<GoldenEntry>> {
    let file = File::open(path).map_err(|e| Error::file(path, e))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| Error::file(path, e))?;
        // Program output interleaved with the log is not always valid UTF-8.
        let line = String::from_utf8_lossy(&line);
        match GoldenEntry::parse_spike(&line) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(reason) => {
                return Err(Error::MalformedLog {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason,
                });
            }
        }
    }

    Ok(entries)
}

/// Drop simulator boot code and everything after the test cleanup sequence.
pub fn filter_golden(entries: Vec<GoldenEntry>, filter: &GoldenFilter) -> Vec<GoldenEntry> {
    let mut entries: Vec<GoldenEntry> = match filter.debug_rom {
        Some((start, end)) => entries
            .into_iter()
            .filter(|e| !(start..=end).contains(&e.pc))
            .collect(),
        None => entries,
    };

    if filter.stop_at_test_cleanup {
        let marker = entries
            .windows(2)
            .position(|w| w[0].instr == CLEANUP_LI_RA_1 && w[1].instr == CLEANUP_AUIPC_T2);
        if let Some(start) = marker {
            // Keep through the signature store that follows the marker.
            entries.truncate(start + 3);
        }
    }

    entries
}

static COMMIT_PATTERN: OnceLock<Regex> = OnceLock::new();
