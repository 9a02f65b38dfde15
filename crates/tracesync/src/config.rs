//! Verification configuration.
//!
//! A single [`Config`] is built at startup (defaults, then JSON config files,
//! then CLI overrides) and passed by reference to reconciliation and
//! comparison. Nothing in the library reads process-wide settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default superscalar reorder window (current position plus three lookahead slots).
pub const DEFAULT_REORDER_WINDOW: usize = 4;

/// Spike's debug ROM, executed before jumping to the ELF entry point.
pub const DEFAULT_DEBUG_ROM: (u32, u32) = (0x1000, 0x2000);

/// Verification settings shared by every binary in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mask the low two bits of golden store addresses before comparison.
    /// Needed for DUTs that only expose word-granular store addresses.
    pub word_boundary_stores: bool,
    /// Total number of register commits searched when looking for an
    /// out-of-order retirement, including the current one. 1 disables reordering.
    pub reorder_window: usize,
    /// Initial value of every register in the shadow register file.
    pub shadow_reset_value: u32,
    /// Golden commit-log filtering.
    pub golden: GoldenFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            word_boundary_stores: false,
            reorder_window: DEFAULT_REORDER_WINDOW,
            shadow_reset_value: 0,
            golden: GoldenFilter::default(),
        }
    }
}

/// Filtering applied to a raw golden commit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoldenFilter {
    /// Inclusive pc range dropped from the log (simulator boot code).
    pub debug_rom: Option<(u32, u32)>,
    /// Cut the log after the riscv-arch-test cleanup sequence.
    pub stop_at_test_cleanup: bool,
}

impl Default for GoldenFilter {
    fn default() -> Self {
        Self {
            debug_rom: Some(DEFAULT_DEBUG_ROM),
            stop_at_test_cleanup: true,
        }
    }
}

impl Config {
    /// Load configuration from JSON files, later files overriding earlier ones
    /// key by key. Missing files are skipped with a warning.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = Map::new();
        for path in paths {
            if !path.exists() {
                warn!("configuration file {} not found", path.display());
                continue;
            }
            debug!("loading configuration from {}", path.display());
            match read_object(path)? {
                Value::Object(object) => merged.extend(object),
                _ => {
                    return Err(Error::InvalidConfig(format!(
                        "{}: expected a JSON object",
                        path.display()
                    )));
                }
            }
        }
        let config: Self = serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.reorder_window == 0 {
            return Err(Error::InvalidConfig(
                "reorder_window must be at least 1".to_string(),
            ));
        }
        match self.golden.debug_rom {
            Some((start, end)) if start > end => Err(Error::InvalidConfig(format!(
                "debug_rom range 0x{start:x}..0x{end:x} is reversed"
            ))),
            _ => Ok(()),
        }
    }
}

fn read_object(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.word_boundary_stores);
        assert_eq!(config.reorder_window, 4);
        assert_eq!(config.shadow_reset_value, 0);
        assert_eq!(config.golden.debug_rom, Some((0x1000, 0x2000)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_layers_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        let over = dir.path().join("override.json");
        std::fs::write(&base, r#"{"word_boundary_stores": true, "reorder_window": 2}"#).unwrap();
        std::fs::write(&over, r#"{"reorder_window": 6}"#).unwrap();
        let missing = dir.path().join("missing.json");

        let config = Config::load(&[base, missing, over]).unwrap();
        assert!(config.word_boundary_stores);
        assert_eq!(config.reorder_window, 6);
        assert_eq!(config.golden, GoldenFilter::default());
    }

    #[test]
    fn test_load_rejects_zero_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"reorder_window": 0}"#).unwrap();
        assert!(matches!(Config::load(&[path]), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_load_nested_golden_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(
            &path,
            r#"{"golden": {"debug_rom": null, "stop_at_test_cleanup": false}}"#,
        )
        .unwrap();
        let config = Config::load(&[path]).unwrap();
        assert_eq!(config.golden.debug_rom, None);
        assert!(!config.golden.stop_at_test_cleanup);
    }
}
