//! tracesync - RISC-V DUT trace reconciliation
//!
//! Rebuilds a single commit stream from the fragmented observations of a
//! device under test (instruction fetches, register-file changes and memory
//! writes) and compares it against the commit log of a golden simulator.
//!
//! # Example
//!
//! ```ignore
//! use tracesync::{Config, compare, reconcile, read_fragmented, read_golden};
//!
//! let config = Config::default();
//! let golden = read_golden("add.spike.json".as_ref())?;
//! let dut = read_fragmented("add.fragmented.json".as_ref())?;
//! let reconciled = reconcile("add", &golden, dut, &config);
//! let mismatches = compare(&golden, &reconciled.entries, &config);
//! ```

pub use tracesync_isa::{Category, StoreWidth, classify};

mod error;
pub use error::{Error, Result};

pub mod batch;
pub mod compare;
pub mod config;
pub mod metrics;
pub mod reconcile;
pub mod reorder;
pub mod report;
pub mod simulator;
pub mod trace;

pub use batch::{BatchOptions, BatchReport, BinaryReport, Pairing, TracePair, pair_traces, run_batch, verify, verify_pair};
pub use compare::{Mismatch, MismatchKind, compare};
pub use config::{Config, GoldenFilter};
pub use reconcile::{Outcome, ReconcileStats, Reconciliation, Stream, StreamCursors, reconcile};
pub use trace::{
    CommitRecord, Fetch, FragmentedTrace, GoldenEntry, MemAccess, ReconciledEntry, RegCommit,
    read_fragmented, read_golden,
};
