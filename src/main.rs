use blockform::adapters::renderer::TeraRenderer;
use blockform::cli::Cli;
use blockform::config::Settings;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load and validate configuration
    let settings = Settings::new_with_cli(&cli)?;
    let registry = settings.build_registry()?;
    info!("Loaded {} block definitions", registry.len());

    if cli.check {
        info!("Configuration is valid");
        return Ok(());
    }

    let renderer = TeraRenderer::new()?;
    let app = blockform::create_app(Arc::new(registry), Arc::new(renderer));

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
