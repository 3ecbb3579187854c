//! Gray Guard CLI
//!
//! Exit status 0 = pass, 1 = request failure or invalid arguments,
//! 2 = threshold breach.

use clap::Parser;
use gray_guard::{cli, GuardCli, GuardStatus};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr; stdout carries the guard report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = match GuardCli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let status = cli::parse_failure_status(&e);
            let _ = e.print();
            std::process::exit(status.into());
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[Gray Guard] Execution failed: cannot start runtime: {}", e);
            std::process::exit(GuardStatus::OperationalFailure.code());
        }
    };

    let status = runtime.block_on(cli::run(cli));
    std::process::exit(status.into());
}
