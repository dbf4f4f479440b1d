//! Beadgraph CLI binary.

use anyhow::Result;
use beadgraph::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the beadgraph CLI.
///
/// Analysis runs on a background thread, so a current-thread runtime is
/// enough for the file I/O done here.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    // Example: RUST_LOG=beadgraph=debug,beadgraph_jsonl=trace beadgraph triage
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("beadgraph=info,beadgraph_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting beadgraph CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Beadgraph CLI completed successfully");
    Ok(())
}
