//! `genway serve`

use crate::http_server;
use genway_core::{Gateway, GatewayConfig};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(mut config: GatewayConfig, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let gateway = Arc::new(Gateway::from_config(&config)?);

    let shutdown = CancellationToken::new();
    let sweeper = gateway.spawn_maintenance(shutdown.clone());

    let result = http_server::serve(gateway, &config.server.bind, shutdown.clone()).await;

    shutdown.cancel();
    join_sweeper(sweeper).await;
    info!("gateway stopped");
    result
}

/// Wait for the sweeper; false when it panicked or was aborted
async fn join_sweeper(sweeper: JoinHandle<()>) -> bool {
    match sweeper.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "rate limiter sweeper did not stop cleanly");
            false
        }
    }
}
