//! Command implementations.
//!
//! Each submodule handles one CLI command and returns a process exit code.

mod batch;
mod compare;
mod golden;

use tracesync::Config;

use crate::cli::{Cli, Commands, EXIT_FAILURE, VerifyArgs};
use crate::terminal;

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Compare {
            golden,
            dut,
            output,
            verify,
        } => match load_config(cli, Some(verify)) {
            Ok(config) => compare::cmd_compare(golden, dut, output.as_deref(), verify.strict, &config),
            Err(code) => code,
        },
        Commands::Batch {
            golden_dir,
            dut_dir,
            output,
            jobs,
            verify,
        } => match load_config(cli, Some(verify)) {
            Ok(config) => batch::cmd_batch(
                golden_dir,
                dut_dir,
                output.clone(),
                *jobs,
                verify.strict,
                &config,
            ),
            Err(code) => code,
        },
        Commands::Golden {
            input,
            output,
            isa,
            memory,
            timeout,
        } => match load_config(cli, None) {
            Ok(config) => golden::cmd_golden(input, output, isa, memory, *timeout, &config),
            Err(code) => code,
        },
        Commands::ParseLog { input, output } => match load_config(cli, None) {
            Ok(config) => golden::cmd_parse_log(input, output, &config),
            Err(code) => code,
        },
    }
}

/// Build the configuration: defaults, then `--config` files, then flags.
fn load_config(cli: &Cli, verify: Option<&VerifyArgs>) -> Result<Config, i32> {
    let mut config = Config::load(&cli.config).map_err(|e| {
        terminal::error(&e.to_string());
        EXIT_FAILURE
    })?;

    if let Some(args) = verify {
        config.word_boundary_stores |= args.word_boundary_stores;
        if let Some(window) = args.reorder_window {
            config.reorder_window = window;
        }
    }

    config.validate().map_err(|e| {
        terminal::error(&e.to_string());
        EXIT_FAILURE
    })?;
    Ok(config)
}
