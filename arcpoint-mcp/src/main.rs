//! `arcpoint-mcp` entry point.
//!
//! Reads configuration from the environment, applies CLI overrides, and runs
//! the relay over the process's stdin and stdout. Logs go to stderr.

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use arcpoint_mcp::cli::{RelayArgs, missing_token_help};
use arcpoint_mcp::error::RelayError;
use arcpoint_mcp::relay::{install_signal_handlers, run_relay};
use arcpoint_mcp_core::{CLIENT_VERSION, ConfigError, OutputSink, RelayConfig};

/// Relay a stdio MCP client to a remote Arcpoint MCP endpoint.
#[derive(Parser)]
#[command(name = "arcpoint-mcp", version)]
struct Cli {
    #[command(flatten)]
    args: RelayArgs,
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.args.verbose);

    let code = match run(cli.args).await {
        Ok(()) => 0,
        Err(RelayError::Config(ConfigError::MissingToken)) => {
            eprintln!("{}", missing_token_help());
            1
        }
        Err(e) => {
            tracing::error!(error = %e, "relay failed");
            eprintln!("arcpoint-mcp: {e}");
            1
        }
    };

    // Exit explicitly: tokio's stdin read runs on a blocking thread that
    // would otherwise keep the runtime alive after shutdown.
    std::process::exit(code);
}

async fn run(args: RelayArgs) -> Result<(), RelayError> {
    let config = args.apply(RelayConfig::from_env()?);
    config.validate()?;

    tracing::info!(
        version = CLIENT_VERSION,
        url = %config.base_url,
        "Arcpoint MCP client starting"
    );

    let shutdown = CancellationToken::new();
    install_signal_handlers(&shutdown);

    run_relay(
        Arc::new(config),
        tokio::io::stdin(),
        OutputSink::stdout(),
        shutdown,
    )
    .await
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing Init
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise tracing with stderr output.
///
/// `verbose` forces `debug`. Otherwise `RUST_LOG` applies, defaulting to
/// `info`. Stdout carries protocol traffic only.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
