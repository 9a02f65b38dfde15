use std::path::Path;

use tracesync::metrics::{self, BinaryStatus};
use tracesync::report::render_mismatches;
use tracesync::trace::base_name;
use tracesync::{Config, Outcome, TracePair, verify_pair};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Reconcile and compare a single golden/DUT trace pair.
pub fn cmd_compare(golden: &Path, dut: &Path, output: Option<&Path>, strict: bool, config: &Config) -> i32 {
    let pair = TracePair {
        name: base_name(golden),
        golden: golden.to_path_buf(),
        dut: dut.to_path_buf(),
    };

    let report = match verify_pair(&pair, output, config) {
        Ok(report) => report,
        Err(e) => {
            metrics::record_binary(BinaryStatus::Error);
            terminal::error(&format!("{}: {e}", pair.name));
            return EXIT_FAILURE;
        }
    };

    if let Outcome::Exhausted { stream, golden_index } = report.outcome {
        terminal::warning(&format!(
            "{} DUT trace ended at golden entry {golden_index} (out of {stream})",
            report.name
        ));
    }
    print!("{}", render_mismatches(&report.name, &report.mismatches));
    if let Some(files) = &report.files {
        terminal::path_output(&files.reconciled);
        terminal::path_output(&files.mismatches);
    }

    let passed = report.passed();
    metrics::record_binary(if passed {
        BinaryStatus::Pass
    } else {
        BinaryStatus::Fail
    });

    if strict && !passed {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}
