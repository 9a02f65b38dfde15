//! Verification of one trace pair, and of whole directories in parallel.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::compare::{Mismatch, compare};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics::{self, BinaryStatus};
use crate::reconcile::{Outcome, ReconcileStats, Reconciliation, reconcile};
use crate::report::{OutputFiles, write_outputs};
use crate::trace::{
    FRAGMENTED_SUFFIX, FragmentedTrace, GOLDEN_SUFFIX, GoldenEntry, base_name, read_fragmented,
    read_golden,
};

/// Golden and DUT trace files sharing a base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePair {
    pub name: String,
    pub golden: PathBuf,
    pub dut: PathBuf,
}

/// A golden trace with no DUT counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub name: String,
    /// The DUT trace that was looked for.
    pub missing: PathBuf,
}

/// Result of pairing two trace directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pub pairs: Vec<TracePair>,
    pub skipped: Vec<Skipped>,
}

/// Pair every `<name>.spike.json` in `golden_dir` with `<name>.fragmented.json`
/// in `dut_dir`.
///
/// Golden traces without a counterpart are skipped. An empty golden directory
/// is an error.
pub fn pair_traces(golden_dir: &Path, dut_dir: &Path) -> Result<Pairing> {
    let mut golden_files = Vec::new();
    for entry in std::fs::read_dir(golden_dir).map_err(|e| Error::file(golden_dir, e))? {
        let path = entry.map_err(|e| Error::file(golden_dir, e))?.path();
        let is_golden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(GOLDEN_SUFFIX));
        if is_golden && path.is_file() {
            golden_files.push(path);
        }
    }
    if golden_files.is_empty() {
        return Err(Error::NoGoldenTraces(golden_dir.to_path_buf()));
    }
    golden_files.sort();

    let mut pairing = Pairing::default();
    for golden in golden_files {
        let name = base_name(&golden);
        let dut = dut_dir.join(format!("{name}{FRAGMENTED_SUFFIX}"));
        if dut.is_file() {
            pairing.pairs.push(TracePair { name, golden, dut });
        } else {
            debug!("no DUT trace for {name}: {}", dut.display());
            pairing.skipped.push(Skipped { name, missing: dut });
        }
    }
    Ok(pairing)
}

/// Reconciled trace and mismatches for one binary, before anything is written.
#[derive(Debug, Clone)]
pub struct Verification {
    pub reconciliation: Reconciliation,
    pub mismatches: Vec<Mismatch>,
}

/// Reconcile and compare one binary's traces.
pub fn verify(name: &str, golden: &[GoldenEntry], dut: FragmentedTrace, config: &Config) -> Verification {
    let reconciliation = reconcile(name, golden, dut, config);
    let mismatches = compare(golden, &reconciliation.entries, config);
    Verification {
        reconciliation,
        mismatches,
    }
}

/// Outcome of verifying one trace pair.
#[derive(Debug, Clone)]
pub struct BinaryReport {
    pub name: String,
    pub outcome: Outcome,
    pub stats: ReconcileStats,
    pub mismatches: Vec<Mismatch>,
    /// Written outputs, if an output directory was given.
    pub files: Option<OutputFiles>,
}

impl BinaryReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Read, verify and optionally persist one trace pair.
#[tracing::instrument(level = "debug", skip_all, fields(binary = %pair.name))]
pub fn verify_pair(pair: &TracePair, out_dir: Option<&Path>, config: &Config) -> Result<BinaryReport> {
    let golden = read_golden(&pair.golden)?;
    let dut = read_fragmented(&pair.dut)?;
    debug!(
        "{} golden entries, {} fetches, {} commits, {} memory accesses",
        golden.len(),
        dut.fetches.len(),
        dut.regfile_commits.len(),
        dut.memory_accesses.len()
    );

    let start = Instant::now();
    let Verification {
        reconciliation,
        mismatches,
    } = verify(&pair.name, &golden, dut, config);
    metrics::record_verification(&reconciliation.stats, mismatches.len(), start.elapsed());

    let files = out_dir
        .map(|dir| write_outputs(dir, &pair.name, &reconciliation.entries, &mismatches))
        .transpose()?;

    Ok(BinaryReport {
        name: pair.name.clone(),
        outcome: reconciliation.outcome,
        stats: reconciliation.stats,
        mismatches,
        files,
    })
}

/// Per-binary result in a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub name: String,
    pub result: Result<BinaryReport>,
}

impl BatchEntry {
    pub fn status(&self) -> BinaryStatus {
        match &self.result {
            Ok(report) if report.passed() => BinaryStatus::Pass,
            Ok(_) => BinaryStatus::Fail,
            Err(_) => BinaryStatus::Error,
        }
    }
}

/// Aggregate result of a directory run, sorted by binary name.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub skipped: Vec<Skipped>,
}

impl BatchReport {
    fn count(&self, status: BinaryStatus) -> usize {
        self.entries.iter().filter(|e| e.status() == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(BinaryStatus::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(BinaryStatus::Fail)
    }

    pub fn errored(&self) -> usize {
        self.count(BinaryStatus::Error)
    }
}

/// Batch run settings.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub out_dir: Option<PathBuf>,
    /// Worker threads; 0 uses every core.
    pub jobs: usize,
}

/// Verify every trace pair in two directories in parallel.
///
/// `on_done` is called from worker threads as each binary finishes.
pub fn run_batch<F>(
    golden_dir: &Path,
    dut_dir: &Path,
    options: &BatchOptions,
    config: &Config,
    on_done: F,
) -> Result<BatchReport>
where
    F: Fn(&BatchEntry) + Sync,
{
    let pairing = pair_traces(golden_dir, dut_dir)?;
    run_pairs(pairing, options, config, on_done)
}

/// Verify already-paired traces in parallel.
pub fn run_pairs<F>(pairing: Pairing, options: &BatchOptions, config: &Config, on_done: F) -> Result<BatchReport>
where
    F: Fn(&BatchEntry) + Sync,
{
    let jobs = if options.jobs == 0 {
        num_cpus::get()
    } else {
        options.jobs
    };
    metrics::record_workers(jobs);
    for _ in &pairing.skipped {
        metrics::record_binary(BinaryStatus::Skip);
    }

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let out_dir = options.out_dir.as_deref();
    let mut entries: Vec<BatchEntry> = pool.install(|| {
        pairing
            .pairs
            .par_iter()
            .map(|pair| {
                let entry = BatchEntry {
                    name: pair.name.clone(),
                    result: verify_pair(pair, out_dir, config),
                };
                if let Err(e) = &entry.result {
                    warn!("{}: {e}", pair.name);
                }
                metrics::record_binary(entry.status());
                on_done(&entry);
                entry
            })
            .collect()
    });
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(BatchReport {
        entries,
        skipped: pairing.skipped,
    })
}
