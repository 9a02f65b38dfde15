use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{FragmentedTrace, GoldenEntry};
use crate::error::{Error, Result};

/// File suffix of golden traces.
pub const GOLDEN_SUFFIX: &str = ".spike.json";
/// File suffix of fragmented DUT traces.
pub const FRAGMENTED_SUFFIX: &str = ".fragmented.json";
/// File suffix of persisted reconciled traces.
pub const RECONCILED_SUFFIX: &str = ".final.json";
/// File suffix of persisted mismatch reports.
pub const MISMATCH_SUFFIX: &str = ".mismatches.json";

/// Read a golden trace (JSON array of commit entries).
pub fn read_golden(path: &Path) -> Result<Vec<GoldenEntry>> {
    read_json(path)
}

/// Read a fragmented DUT trace.
///
/// The harness prefixes its output with `#` comment lines; those are skipped.
pub fn read_fragmented(path: &Path) -> Result<FragmentedTrace> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
    serde_json::from_str(strip_comment_header(&text)).map_err(|source| Error::MalformedTrace {
        path: path.to_path_buf(),
        source,
    })
}

/// Skip leading lines starting with `#`.
fn strip_comment_header(text: &str) -> &str {
    let mut rest = text;
    while rest.trim_start().starts_with('#') {
        let trimmed = rest.trim_start();
        rest = trimmed.find('\n').map_or("", |nl| &trimmed[nl + 1..]);
    }
    rest
}

/// Write a value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::file(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n").map_err(|e| Error::file(path, e))?;
    writer.flush().map_err(|e| Error::file(path, e))?;
    Ok(())
}

/// Name of the binary a trace file belongs to: the file name up to the first `.`.
///
/// `add.spike.json` and `add.fragmented.json` both yield `add`.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or_default()
        .to_string()
}
