//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::commands;
use genway_core::GatewayConfig;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: GatewayConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { bind } => commands::serve::run(config, bind).await,
        Commands::Generate(args) => commands::generate::run(config, args).await,
        Commands::Providers => commands::providers::show(&config),
        Commands::Resolve { tier } => commands::resolve::show(&config, &tier),
    }
}
