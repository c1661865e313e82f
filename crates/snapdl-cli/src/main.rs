use clap::Parser;
use snapdl_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Verbose runs log to the terminal; otherwise to the XDG state file.
    if cli.enable_log {
        logging::init_logging_stderr();
    } else if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", err);
    }

    if let Err(err) = cli::run(cli).await {
        eprintln!("snapdl error: {:#}", err);
        std::process::exit(1);
    }
}
