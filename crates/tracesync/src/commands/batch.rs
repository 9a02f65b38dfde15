use std::path::{Path, PathBuf};

use tracesync::batch::run_pairs;
use tracesync::report::render_mismatches;
use tracesync::{BatchOptions, Config, pair_traces};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Progress};

/// Verify every trace pair found in two directories.
pub fn cmd_batch(
    golden_dir: &Path,
    dut_dir: &Path,
    output: Option<PathBuf>,
    jobs: usize,
    strict: bool,
    config: &Config,
) -> i32 {
    let pairing = match pair_traces(golden_dir, dut_dir) {
        Ok(pairing) => pairing,
        Err(e) => {
            terminal::error(&e.to_string());
            return EXIT_FAILURE;
        }
    };
    for skipped in &pairing.skipped {
        println!("DUT trace file not found: {}", skipped.missing.display());
    }

    terminal::info(&format!(
        "Verifying {} binaries ({} skipped)",
        pairing.pairs.len(),
        pairing.skipped.len()
    ));
    let progress = Progress::new(pairing.pairs.len() as u64, "Verifying");
    let options = BatchOptions {
        out_dir: output,
        jobs,
    };
    let result = run_pairs(pairing, &options, config, |_| progress.inc(1));
    progress.finish();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            terminal::error(&e.to_string());
            return EXIT_FAILURE;
        }
    };

    for entry in &report.entries {
        match &entry.result {
            Ok(binary) => print!("{}", render_mismatches(&binary.name, &binary.mismatches)),
            Err(e) => terminal::error(&format!("{}: {e}", entry.name)),
        }
    }

    let summary = format!(
        "{} passed, {} failed, {} errored, {} skipped",
        report.passed(),
        report.failed(),
        report.errored(),
        report.skipped.len()
    );
    if report.errored() > 0 || (strict && report.failed() > 0) {
        terminal::error(&summary);
        EXIT_FAILURE
    } else if report.failed() > 0 {
        terminal::warning(&summary);
        EXIT_SUCCESS
    } else {
        terminal::success(&summary);
        EXIT_SUCCESS
    }
}
