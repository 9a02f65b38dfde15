use std::path::Path;
use std::time::Duration;

use tracesync::Config;
use tracesync::simulator::{SpikeOptions, find_elfs, find_spike, generate_golden};
use tracesync::trace::{filter_golden, parse_commit_log, write_json};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Spinner};

/// Generate golden traces for one ELF or a directory of ELFs.
pub fn cmd_golden(input: &Path, output: &Path, isa: &str, memory: &str, timeout: u64, config: &Config) -> i32 {
    let Some(spike) = find_spike() else {
        terminal::error("Spike not found in PATH");
        eprintln!("Install from https://github.com/riscv-software-src/riscv-isa-sim");
        return EXIT_FAILURE;
    };

    let elfs = if input.is_dir() {
        match find_elfs(input) {
            Ok(elfs) => elfs,
            Err(e) => {
                terminal::error(&e.to_string());
                return EXIT_FAILURE;
            }
        }
    } else {
        vec![input.to_path_buf()]
    };
    if elfs.is_empty() {
        terminal::error(&format!("No ELF files found in {}", input.display()));
        return EXIT_FAILURE;
    }

    let options = SpikeOptions {
        isa: isa.to_string(),
        memory: memory.to_string(),
        timeout: Duration::from_secs(timeout),
    };

    let mut failed = 0usize;
    for elf in &elfs {
        let spinner = Spinner::new(format!("Running Spike on {}", elf.display()));
        match generate_golden(&spike, elf, output, &options, &config.golden) {
            Ok(path) => {
                spinner.finish_with_success(&format!("{}", elf.display()));
                terminal::path_output(&path);
            }
            Err(e) => {
                spinner.finish_with_failure(&format!("{}: {e}", elf.display()));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        terminal::error(&format!("{failed} of {} golden runs failed", elfs.len()));
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

/// Convert an existing Spike commit log into a golden trace.
pub fn cmd_parse_log(input: &Path, output: &Path, config: &Config) -> i32 {
    let entries = match parse_commit_log(input) {
        Ok(entries) => filter_golden(entries, &config.golden),
        Err(e) => {
            terminal::error(&e.to_string());
            return EXIT_FAILURE;
        }
    };

    if let Err(e) = write_json(output, &entries) {
        terminal::error(&e.to_string());
        return EXIT_FAILURE;
    }
    terminal::success(&format!("Wrote {} golden entries", entries.len()));
    terminal::path_output(output);
    EXIT_SUCCESS
}
