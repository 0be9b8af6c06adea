//! `genway providers`

use genway_core::{GatewayConfig, ProviderRegistry};

pub fn show(config: &GatewayConfig) -> anyhow::Result<()> {
    let registry = ProviderRegistry::from_env(config.providers.clone());

    println!("{:<12} {:<11} {:<19} BASE URL", "PROVIDER", "CONFIGURED", "WIRE");
    for status in registry.status() {
        println!(
            "{:<12} {:<11} {:<19} {}",
            status.id,
            if status.configured { "yes" } else { "no" },
            status.wire.to_string(),
            status.base_url
        );
    }
    Ok(())
}
