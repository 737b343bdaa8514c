use axum_helpers::server::create_production_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_queue::{Gateway, GatewayOptions};
use std::time::Duration;
use tracing::info;

mod config;

use config::{Config, Environment};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    // Load configuration from environment variables
    let config = Config::from_env(environment)?;

    info!(
        backend = %config.queue.backend,
        queues = ?config.queue.queues,
        "Connecting to queue backend"
    );
    let queue = domain_queue::connect(&config.queue.backend, &config.queue.queues).await?;

    let options = GatewayOptions {
        strict_json_api: config.strict_json_api,
        ..GatewayOptions::default()
    };
    let app = Gateway::new(queue.clone(), options).router();

    info!("Starting Kewpie gateway with production-ready shutdown (30s timeout)");

    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        info!("Shutting down: releasing queue backend");
        drop(queue);
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Kewpie gateway shutdown complete");
    Ok(())
}
