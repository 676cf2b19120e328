use dotenvy::dotenv;
use service_core::observability::init_tracing;
use token_service::config::TokenServiceConfig;
use token_service::services::init_metrics;
use token_service::startup::Application;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.is_empty());
    init_tracing("token-service", "info", otlp_endpoint.as_deref());

    init_metrics();

    let config = TokenServiceConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    let version = config.version.clone();
    let reveal_enabled = config.reveal_enabled();

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    info!(
        port = app.port(),
        version = %version,
        credentials = app.credential_count(),
        reveal_enabled,
        "Starting token-service"
    );

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
