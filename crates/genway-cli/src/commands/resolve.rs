//! `genway resolve <tier>`

use genway_core::{GatewayConfig, ProviderRegistry, ProviderResolver, QualityTier};
use std::sync::Arc;

pub fn show(config: &GatewayConfig, tier: &str) -> anyhow::Result<()> {
    let tier: QualityTier = tier.parse()?;
    let registry = Arc::new(ProviderRegistry::from_env(config.providers.clone()));
    let resolver = ProviderResolver::new(
        registry,
        config.preferences.clone(),
        config.baseline.clone(),
    );

    println!("Candidates for tier '{}':", tier);
    for candidate in resolver.resolve(tier) {
        println!(
            "  {}. {} / {}",
            candidate.position + 1,
            candidate.provider,
            candidate.model
        );
    }
    Ok(())
}
