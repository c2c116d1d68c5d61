use farmkonnect_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; falls back to stderr.
    let sink = logging::init();
    tracing::debug!(?sink, "logging ready");

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("farmkonnect error: {:#}", err);
        std::process::exit(1);
    }
}
