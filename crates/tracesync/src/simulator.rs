//! Golden trace generation with the Spike ISA simulator.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::GoldenFilter;
use crate::error::{Error, Result};
use crate::trace::{GOLDEN_SUFFIX, filter_golden, parse_commit_log, write_json};

/// Default ISA string passed to Spike.
pub const DEFAULT_ISA: &str = "rv32i";
/// Default memory layout (`base:size`) passed to Spike.
pub const DEFAULT_MEMORY: &str = "0x7ffff000:0x10000";
/// Default Spike timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Spike invocation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpikeOptions {
    pub isa: String,
    pub memory: String,
    pub timeout: Duration,
}

impl Default for SpikeOptions {
    fn default() -> Self {
        Self {
            isa: DEFAULT_ISA.to_string(),
            memory: DEFAULT_MEMORY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Find the Spike executable in PATH.
pub fn find_spike() -> Option<PathBuf> {
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join("spike"))
            .find(|path| path.is_file())
    })
}

/// Wait for a command, killing it once `timeout` has elapsed.
pub fn run_command_with_timeout(cmd: &mut Command, timeout: Duration) -> std::io::Result<ExitStatus> {
    let mut child = cmd.spawn()?;
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "command timed out",
            ));
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// Run Spike on `elf`, capturing its commit log to `<stem>.trace` in `out_dir`.
///
/// Spike writes the commit log to stderr; stdout is captured to the same file.
pub fn run_spike(spike: &Path, elf: &Path, out_dir: &Path, options: &SpikeOptions) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir).map_err(|e| Error::file(out_dir, e))?;
    let stem = elf
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("trace");
    let log_path = out_dir.join(format!("{stem}.trace"));

    let log = File::create(&log_path).map_err(|e| Error::file(&log_path, e))?;
    let log_err = log.try_clone().map_err(|e| Error::file(&log_path, e))?;

    let mut cmd = Command::new(spike);
    cmd.arg(format!("--isa={}", options.isa))
        .arg("--log-commits")
        .arg(format!("-m{}", options.memory))
        .arg(elf)
        .stdin(Stdio::null())
        .stdout(log)
        .stderr(log_err);
    debug!("running {cmd:?}");

    match run_command_with_timeout(&mut cmd, options.timeout) {
        Ok(status) if status.success() => Ok(log_path),
        Ok(status) => Err(Error::SimulatorFailed(status.code())),
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            Err(Error::SimulatorTimeout(options.timeout.as_secs()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::SimulatorNotFound),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Run Spike, parse and filter its commit log, and write `<stem>.spike.json`.
pub fn generate_golden(
    spike: &Path,
    elf: &Path,
    out_dir: &Path,
    options: &SpikeOptions,
    filter: &GoldenFilter,
) -> Result<PathBuf> {
    let log_path = run_spike(spike, elf, out_dir, options)?;
    let entries = filter_golden(parse_commit_log(&log_path)?, filter);

    let stem = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("trace");
    let golden_path = out_dir.join(format!("{stem}{GOLDEN_SUFFIX}"));
    write_json(&golden_path, &entries)?;
    info!(
        "wrote {} golden entries to {}",
        entries.len(),
        golden_path.display()
    );
    Ok(golden_path)
}

/// All `*.elf` files directly inside `dir`, sorted.
pub fn find_elfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut elfs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::file(dir, e))? {
        let path = entry.map_err(|e| Error::file(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "elf") {
            elfs.push(path);
        }
    }
    elfs.sort();
    Ok(elfs)
}
