//! tracesync CLI - DUT trace reconciliation

mod cli;
mod commands;
mod terminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let metrics_handle = if cli.metrics {
        tracesync::metrics::CliRecorder::new().install()
    } else {
        None
    };
    tracesync::metrics::init();

    let default_directive = if cli.verbose {
        "tracesync=debug"
    } else if cli.silent {
        "tracesync=error"
    } else {
        "tracesync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let exit_code = commands::run_command(&cli);

    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
