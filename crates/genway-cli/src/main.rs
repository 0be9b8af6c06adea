//! Genway CLI
//!
//! Runs the generation gateway as an HTTP service (`genway serve`) or
//! drives it directly from the terminal for one-off generations and
//! diagnostics.
//!
//! ```bash
//! genway serve --bind 0.0.0.0:8787
//! genway generate "pricing table with three plans" --kind component --tier quality
//! genway resolve fast
//! ```

mod args;
mod commands;
mod http_server;
mod router;

use args::Cli;
use clap::Parser;
use genway_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = genway_core::load_config(Some(&cli.config_path()))?;

    init_tracing(&config.logging, cli.verbose);
    router::route(cli, config).await
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies, raised
/// to `debug` by `--verbose`. Logs go to stderr so generated output on
/// stdout stays clean.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        "compact" => builder.compact().init(),
        _ => builder.init(),
    }
}
