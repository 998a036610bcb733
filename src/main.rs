//! tptctl binary entry point

use std::process::ExitCode;

use tptctl::cli::{self, Cli};
use tptctl::ui::output;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let default_level = if cli.debug { "tptctl=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(e);
            ExitCode::FAILURE
        }
    }
}
