//! TripGenie HTTP server
//!
//! Starts an Axum web server exposing trip planning, shuffle and chat.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tripgenie::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    llm::{LlmGateway, build_provider},
    metrics::Metrics,
    pipeline::TripPipeline,
    storage::InMemoryTripRepository,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting TripGenie server on {}:{}",
        config.server.host,
        config.server.port
    );

    let metrics = Arc::new(Metrics::new()?);

    // Credentials are read once here; a missing key stops startup
    let provider = build_provider(&config.provider).map_err(|e| {
        tracing::error!(error = %e, "Failed to construct model provider");
        e
    })?;
    let gateway = Arc::new(LlmGateway::from_config(
        &config.provider,
        provider,
        metrics.clone(),
    ));

    tracing::info!(
        provider = gateway.provider_name(),
        model = gateway.model(),
        timeout_seconds = gateway.timeout().as_secs(),
        "Model provider ready"
    );

    let pipeline = Arc::new(TripPipeline::new(gateway, metrics.clone()));
    let state = AppState::new(
        pipeline,
        Arc::new(InMemoryTripRepository::new()),
        metrics,
        &config.rate_limits,
    );
    let app = handlers::build_router(state);

    let addr = config.server.socket_addr()?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
