//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracesync::simulator::{DEFAULT_ISA, DEFAULT_MEMORY, DEFAULT_TIMEOUT_SECS};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "tracesync")]
#[command(about = "Reconcile fragmented DUT traces against a golden RISC-V commit trace")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    /// JSON configuration file; may be repeated, later files override earlier ones
    #[arg(long = "config", global = true, value_name = "FILE")]
    pub config: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile and compare a single trace pair
    Compare {
        /// Golden trace (`<name>.spike.json`)
        #[arg(short = 's', long = "spike-trace", value_name = "FILE")]
        golden: PathBuf,

        /// Fragmented DUT trace (`<name>.fragmented.json`)
        #[arg(short = 'd', long = "dut-trace", value_name = "FILE")]
        dut: PathBuf,

        /// Directory for `<name>.final.json` and `<name>.mismatches.json`
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        verify: VerifyArgs,
    },
    /// Reconcile and compare every trace pair in two directories
    Batch {
        /// Directory of golden traces
        #[arg(short = 'S', long = "spike-trace-dir", value_name = "DIR")]
        golden_dir: PathBuf,

        /// Directory of fragmented DUT traces
        #[arg(short = 'D', long = "dut-trace-dir", value_name = "DIR")]
        dut_dir: PathBuf,

        /// Directory for per-binary outputs
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Number of parallel jobs (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,

        #[command(flatten)]
        verify: VerifyArgs,
    },
    /// Run Spike on an ELF (or every ELF in a directory) and write golden traces
    Golden {
        /// Input ELF file or directory of `*.elf` files
        #[arg(value_name = "ELF")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// ISA string passed to Spike
        #[arg(long, default_value = DEFAULT_ISA)]
        isa: String,

        /// Spike memory layout (`base:size`)
        #[arg(long, default_value = DEFAULT_MEMORY)]
        memory: String,

        /// Timeout in seconds per ELF
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },
    /// Convert an existing Spike commit log into a golden trace
    ParseLog {
        /// Spike `--log-commits` output
        #[arg(value_name = "LOG")]
        input: PathBuf,

        /// Output golden trace file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

/// Options shared by `compare` and `batch`.
#[derive(Args, Clone)]
pub struct VerifyArgs {
    /// Align golden store addresses to word boundaries before comparing
    #[arg(long)]
    pub word_boundary_stores: bool,

    /// Superscalar reorder window, including the current commit (1 disables)
    #[arg(long, value_name = "N")]
    pub reorder_window: Option<usize>,

    /// Exit with failure if any mismatch is found
    #[arg(long)]
    pub strict: bool,
}
