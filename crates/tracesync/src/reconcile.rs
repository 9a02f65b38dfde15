//! Reconstruction of a DUT commit stream from fragmented observations.
//!
//! The golden trace is walked entry by entry while the DUT fetch stream is
//! walked in lockstep. Fetches whose pc does not match the next golden pc are
//! speculative; once the pcs align, the instruction word decides whether a
//! register commit, a memory access, or nothing is consumed alongside the
//! fetch. All three cursors only move forward.

use std::fmt;

use serde::Serialize;
use tracesync_isa::{Category, classify, writes_to_zero_register};
use tracing::{debug, warn};

use crate::config::Config;
use crate::reorder::{Reorder, reorder_commits};
use crate::trace::{Fetch, FragmentedTrace, GoldenEntry, NUM_REGS, ReconciledEntry, RegCommit};

#[cfg(test)]
mod tests;

/// One of the three fragmented DUT streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Fetches,
    RegfileCommits,
    MemoryAccesses,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetches => write!(f, "fetches"),
            Self::RegfileCommits => write!(f, "regfile commits"),
            Self::MemoryAccesses => write!(f, "memory accesses"),
        }
    }
}

/// How a reconciliation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every golden entry was matched to a DUT fetch.
    Complete,
    /// A DUT stream ran out while processing golden entry `golden_index`.
    Exhausted { stream: Stream, golden_index: usize },
}

/// Positions in the three DUT streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamCursors {
    pub fetch_idx: usize,
    pub commit_idx: usize,
    pub mem_idx: usize,
}

/// Counters collected during reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Fetches skipped because their pc did not match the golden pc.
    pub speculative_fetches: usize,
    /// Aligned fetches with an unrecognized encoding.
    pub unknown_instructions: usize,
    /// Commits synthesized for same-value register rewrites.
    pub synthesized_commits: usize,
    /// Commits swapped into place by the superscalar reorderer.
    pub reordered_commits: usize,
}

/// Result of reconciling one binary.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// One entry per DUT fetch consumed, in fetch order.
    pub entries: Vec<ReconciledEntry>,
    pub outcome: Outcome,
    /// Final cursor positions.
    pub cursors: StreamCursors,
    pub stats: ReconcileStats,
}

impl Reconciliation {
    pub const fn is_complete(&self) -> bool {
        matches!(self.outcome, Outcome::Complete)
    }
}

/// Reconcile a fragmented DUT trace against the golden trace.
///
/// `name` identifies the binary in log output. Stream exhaustion is not an
/// error: the entries built so far are returned with [`Outcome::Exhausted`].
#[tracing::instrument(level = "debug", skip_all, fields(binary = name))]
pub fn reconcile(
    name: &str,
    golden: &[GoldenEntry],
    dut: FragmentedTrace,
    config: &Config,
) -> Reconciliation {
    let mut reconciler = Reconciler::new(dut, config);

    for (index, entry) in golden.iter().enumerate() {
        if let Err(stream) = reconciler.step(entry) {
            warn!("{name} trace ended before expected (out of {stream})");
            return reconciler.finish(Outcome::Exhausted {
                stream,
                golden_index: index,
            });
        }
    }

    reconciler.finish(Outcome::Complete)
}

/// Single forward pass over the DUT streams.
struct Reconciler<'a> {
    config: &'a Config,
    dut: FragmentedTrace,
    cursors: StreamCursors,
    /// Register file as seen by the golden trace so far.
    shadow: [u32; NUM_REGS],
    entries: Vec<ReconciledEntry>,
    stats: ReconcileStats,
}

impl<'a> Reconciler<'a> {
    fn new(dut: FragmentedTrace, config: &'a Config) -> Self {
        Self {
            config,
            entries: Vec::with_capacity(dut.fetches.len()),
            dut,
            cursors: StreamCursors::default(),
            shadow: [config.shadow_reset_value; NUM_REGS],
            stats: ReconcileStats::default(),
        }
    }

    fn finish(self, outcome: Outcome) -> Reconciliation {
        Reconciliation {
            entries: self.entries,
            outcome,
            cursors: self.cursors,
            stats: self.stats,
        }
    }

    /// Consume one golden entry, plus any speculative fetches before it.
    fn step(&mut self, golden: &GoldenEntry) -> Result<(), Stream> {
        let synthesized = self.splice_repeated_write(golden);
        let fetch = self.align_fetch(golden)?;

        let category = classify(fetch.instr);
        let mut entry = ReconciledEntry::fetch_only(fetch);
        let mut consumed_commit = false;

        match category {
            Category::Load | Category::RegisterOp | Category::Jump => {
                if !writes_to_zero_register(fetch.instr) {
                    // Jumps retire in order; only loads and ALU ops are reordered.
                    let commit = self.take_commit(golden, category != Category::Jump)?;
                    entry.target_reg = Some(commit.reg);
                    entry.reg_val = Some(commit.value);
                    consumed_commit = true;
                    if let Some(write) = golden.register_write() {
                        if let Some(slot) = self.shadow.get_mut(usize::from(write.reg)) {
                            *slot = write.value;
                        }
                    }
                }
            }
            Category::StoreByte | Category::StoreHalf | Category::StoreWord => {
                let access = *self
                    .dut
                    .memory_accesses
                    .get(self.cursors.mem_idx)
                    .ok_or(Stream::MemoryAccesses)?;
                let lane_addr = golden.mem_addr.unwrap_or(access.addr);
                entry.mem_addr = Some(access.addr);
                entry.mem_val = category
                    .store_width()
                    .map(|width| width.narrow(access.raw, lane_addr));
                self.cursors.mem_idx += 1;
            }
            Category::Branch | Category::Fence => {}
            Category::Unknown => {
                warn!(
                    "unknown instruction 0x{:08x} at pc 0x{:08x}, treating as speculative",
                    fetch.instr, fetch.pc
                );
                entry.speculative_fetch = true;
                self.stats.unknown_instructions += 1;
            }
        }

        if synthesized && !consumed_commit {
            // Nothing consumed the synthetic commit; drop it so it cannot shift
            // later register effects.
            self.dut.regfile_commits.remove(self.cursors.commit_idx);
            self.stats.synthesized_commits -= 1;
        }
        entry.speculative_commit = synthesized && consumed_commit;

        self.cursors.fetch_idx += 1;
        self.entries.push(entry);
        Ok(())
    }

    /// Insert the commit a same-value rewrite would have produced.
    ///
    /// The DUT harness diffs the register file, so rewriting a register with
    /// its current value leaves no trace in the commit stream.
    fn splice_repeated_write(&mut self, golden: &GoldenEntry) -> bool {
        let Some(write) = golden.register_write() else {
            return false;
        };
        let reg = usize::from(write.reg);
        if reg == 0 || reg >= NUM_REGS || self.shadow[reg] != write.value {
            return false;
        }

        debug!(
            "synthesizing commit x{} = 0x{:08x} at commit {}",
            write.reg, write.value, self.cursors.commit_idx
        );
        self.dut.regfile_commits.insert(self.cursors.commit_idx, write);
        self.stats.synthesized_commits += 1;
        true
    }

    /// Skip speculative fetches until one matches the golden pc.
    fn align_fetch(&mut self, golden: &GoldenEntry) -> Result<Fetch, Stream> {
        loop {
            let fetch = *self
                .dut
                .fetches
                .get(self.cursors.fetch_idx)
                .ok_or(Stream::Fetches)?;
            if fetch.pc == golden.pc {
                return Ok(fetch);
            }

            let mut entry = ReconciledEntry::fetch_only(fetch);
            entry.speculative_fetch = true;
            self.entries.push(entry);
            self.cursors.fetch_idx += 1;
            self.stats.speculative_fetches += 1;
        }
    }

    /// Consume the register commit at the cursor, optionally reordering first.
    fn take_commit(&mut self, golden: &GoldenEntry, reorder: bool) -> Result<RegCommit, Stream> {
        let at = self.cursors.commit_idx;
        if at >= self.dut.regfile_commits.len() {
            return Err(Stream::RegfileCommits);
        }

        let expected = golden.register_write().filter(|_| reorder);
        if let Some(expected) = expected {
            let window = self.config.reorder_window;
            if let Reorder::Found { offset } =
                reorder_commits(&mut self.dut.regfile_commits, at, expected, window)
            {
                debug!(
                    "reordered commit x{} from {} to {}",
                    expected.reg,
                    at + offset,
                    at
                );
                self.stats.reordered_commits += 1;
            }
        }

        self.cursors.commit_idx += 1;
        Ok(self.dut.regfile_commits[at])
    }
}
